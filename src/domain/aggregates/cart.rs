//! Cart Aggregate
//!
//! One cart per user. `product_ids` keeps insertion order and `quantities`
//! holds exactly one positive entry for each of those ids.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;
use crate::domain::value_objects::{Quantity, QuantityError};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    product_ids: Vec<Uuid>,
    quantities: BTreeMap<Uuid, u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Which branch of the add-to-cart merge was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome { Created, ProductAdded, QuantityUpdated }

impl AddOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Created => "Cart created and product added successfully",
            Self::ProductAdded => "Product added to cart successfully",
            Self::QuantityUpdated => "Product quantity updated successfully",
        }
    }
}

impl Cart {
    pub fn open(user_id: Uuid, product_id: Uuid, quantity: Quantity) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), user_id,
            product_ids: vec![product_id],
            quantities: BTreeMap::from([(product_id, quantity.value())]),
            created_at: now, updated_at: now,
        }
    }

    /// Rebuilds a cart from stored columns, refusing rows that break the lockstep rule.
    pub fn from_parts(
        id: Uuid,
        user_id: Uuid,
        product_ids: Vec<Uuid>,
        quantities: BTreeMap<Uuid, u32>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, CartError> {
        let mut seen = std::collections::BTreeSet::new();
        let consistent = product_ids.len() == quantities.len()
            && product_ids.iter().all(|p| seen.insert(*p) && quantities.get(p).is_some_and(|q| *q > 0));
        if !consistent { return Err(CartError::Inconsistent); }
        Ok(Self { id, user_id, product_ids, quantities, created_at, updated_at })
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn product_ids(&self) -> &[Uuid] { &self.product_ids }
    pub fn quantities(&self) -> &BTreeMap<Uuid, u32> { &self.quantities }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.product_ids.is_empty() }
    pub fn contains(&self, product_id: Uuid) -> bool { self.quantities.contains_key(&product_id) }
    pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> { self.quantities.get(&product_id).copied() }

    /// Line items in cart order.
    pub fn lines(&self) -> impl Iterator<Item = (Uuid, u32)> + '_ {
        self.product_ids.iter().filter_map(|p| self.quantities.get(p).map(|q| (*p, *q)))
    }

    /// Adds a product, summing with the existing quantity when it is already present.
    /// A sum past `u32::MAX` is refused and leaves the cart untouched.
    pub fn add_item(&mut self, product_id: Uuid, quantity: Quantity) -> Result<AddOutcome, QuantityError> {
        let outcome = match self.quantities.get_mut(&product_id) {
            Some(existing) => {
                let merged = Quantity::new(i64::from(*existing))?.checked_add(quantity)?;
                *existing = merged.value();
                AddOutcome::QuantityUpdated
            }
            None => {
                self.product_ids.push(product_id);
                self.quantities.insert(product_id, quantity.value());
                AddOutcome::ProductAdded
            }
        };
        self.touch();
        Ok(outcome)
    }

    /// Overwrites the quantity of a product already in the cart.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: Quantity) -> Result<(), CartError> {
        let entry = self.quantities.get_mut(&product_id).ok_or(CartError::ProductNotInCart)?;
        *entry = quantity.value();
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), CartError> {
        self.quantities.remove(&product_id).ok_or(CartError::ProductNotInCart)?;
        self.product_ids.retain(|p| *p != product_id);
        self.touch();
        Ok(())
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ProductNotInCart, Inconsistent }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProductNotInCart => write!(f, "Product not found in the cart"),
            Self::Inconsistent => write!(f, "Cart product ids and quantities disagree"),
        }
    }
}
