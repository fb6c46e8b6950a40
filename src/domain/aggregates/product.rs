//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;
use crate::domain::value_objects::Rating;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    rating: RatingSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub attributes: Map<String, Value>,
}

#[derive(Clone, Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub attributes: Option<Map<String, Value>>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.category_id.is_none() && self.attributes.is_none()
    }
}

impl Product {
    pub fn create(new: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name: new.name, price: new.price, category_id: new.category_id,
            attributes: new.attributes, rating: RatingSummary::default(),
            created_at: now, updated_at: now,
        }
    }

    /// Rebuilds a stored product, summary included.
    pub(crate) fn restore(id: Uuid, fields: NewProduct, rating: RatingSummary, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id, name: fields.name, price: fields.price, category_id: fields.category_id,
            attributes: fields.attributes, rating, created_at, updated_at,
        }
    }

    pub fn rating(&self) -> &RatingSummary { &self.rating }

    /// Attaches a stored summary; only storage backends hydrating or persisting the summary call this.
    pub(crate) fn with_rating(mut self, rating: RatingSummary) -> Self {
        self.rating = rating;
        self
    }

    pub fn apply(&mut self, changes: ProductChanges) {
        if let Some(name) = changes.name { self.name = name; }
        if let Some(price) = changes.price { self.price = price; }
        if let Some(category_id) = changes.category_id { self.category_id = Some(category_id); }
        if let Some(attributes) = changes.attributes { self.attributes = attributes; }
        self.updated_at = Utc::now();
    }

    /// Compares the textual form of a scalar attribute with `value`.
    pub fn attribute_matches(&self, name: &str, value: &str) -> bool {
        match self.attributes.get(name) {
            Some(Value::String(s)) => s == value,
            Some(Value::Number(n)) => n.to_string() == value,
            Some(Value::Bool(b)) => b.to_string() == value,
            _ => false,
        }
    }
}

/// Denormalized review summary stored on a product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: u64,
    pub rating_distribution: RatingDistribution,
}

/// Review count per star value; all five buckets are always present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<u8, u64>", into = "BTreeMap<u8, u64>")]
pub struct RatingDistribution([u64; 5]);

impl RatingDistribution {
    pub fn record(&mut self, rating: Rating) {
        if let Some(slot) = self.0.get_mut(rating.bucket()) { *slot += 1; }
    }
    pub fn count(&self, stars: u8) -> u64 {
        stars.checked_sub(Rating::MIN).and_then(|i| self.0.get(usize::from(i))).copied().unwrap_or(0)
    }
    pub fn total(&self) -> u64 { self.0.iter().sum() }
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (Rating::MIN..=Rating::MAX).zip(self.0.iter().copied())
    }
}

impl From<BTreeMap<u8, u64>> for RatingDistribution {
    fn from(map: BTreeMap<u8, u64>) -> Self {
        let mut buckets = [0; 5];
        for (stars, count) in map {
            if let Some(slot) = stars.checked_sub(Rating::MIN).and_then(|i| buckets.get_mut(usize::from(i))) {
                *slot = count;
            }
        }
        Self(buckets)
    }
}

impl From<RatingDistribution> for BTreeMap<u8, u64> {
    fn from(d: RatingDistribution) -> Self { d.iter().collect() }
}
