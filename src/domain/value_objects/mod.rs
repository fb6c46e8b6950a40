//! Value Objects for the catalog

use serde::{Serialize, Serializer};
use std::fmt;

/// Cart line quantity, always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::BelowOne); }
        u32::try_from(value).map(Self).map_err(|_| QuantityError::TooLarge)
    }
    pub fn value(&self) -> u32 { self.0 }
    /// Sum of two quantities, refused rather than clamped when it leaves `u32`.
    pub fn checked_add(&self, other: Quantity) -> Result<Self, QuantityError> {
        self.0.checked_add(other.0).map(Self).ok_or(QuantityError::TooLarge)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { serializer.serialize_u32(self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { BelowOne, TooLarge }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowOne => write!(f, "Quantity must be at least 1"),
            Self::TooLarge => write!(f, "Quantity is too large"),
        }
    }
}

/// Star rating between 1 and 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, RatingError> {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(RatingError::OutOfRange),
        }
    }
    pub fn value(&self) -> u8 { self.0 }

    /// Zero-based bucket index, 0 for one star.
    pub fn bucket(&self) -> usize { usize::from(self.0 - Self::MIN) }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { serializer.serialize_u8(self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum RatingError { OutOfRange }
impl std::error::Error for RatingError {}
impl fmt::Display for RatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Rating must be between 1 and 5") }
}
