//! TechMarket Catalog API
//!
//! Shopping-catalog REST service with a per-user cart and product reviews.
//!
//! ## Features
//! - Product and category catalog
//! - One shopping cart per user with additive merges
//! - Reviews with a rating summary kept in sync on each product
//! - In-memory or PostgreSQL storage

pub mod api;
pub mod config;
pub mod domain;
pub mod services;
pub mod storage;

use thiserror::Error;

use crate::domain::{CartError, QuantityError, RatingError, ReviewError};
use crate::storage::StorageError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum TechMarketError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    StateConflict(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TechMarketError {
    pub fn validation(message: impl Into<String>) -> Self { Self::Validation(message.into()) }
    pub fn not_found(message: impl Into<String>) -> Self { Self::NotFound(message.into()) }
}

impl From<QuantityError> for TechMarketError {
    fn from(e: QuantityError) -> Self { Self::Validation(e.to_string()) }
}

impl From<RatingError> for TechMarketError {
    fn from(e: RatingError) -> Self { Self::Validation(e.to_string()) }
}

impl From<ReviewError> for TechMarketError {
    fn from(e: ReviewError) -> Self { Self::StateConflict(e.to_string()) }
}

impl From<CartError> for TechMarketError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ProductNotInCart => Self::NotFound(e.to_string()),
            CartError::Inconsistent => Self::Storage(StorageError::Corrupt(e.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, TechMarketError>;
