//! Review Aggregate and rating statistics

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;
use crate::domain::aggregates::product::{RatingDistribution, RatingSummary};
use crate::domain::value_objects::Rating;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: Rating,
    pub title: String,
    pub content: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub verified_purchase: bool,
    pub helpful_votes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewReview {
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: Rating,
    pub title: String,
    pub content: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub verified_purchase: bool,
}

/// Partial update; `None` leaves the stored field as it is.
#[derive(Clone, Debug, Default)]
pub struct ReviewChanges {
    pub rating: Option<Rating>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub pros: Option<Vec<String>>,
    pub cons: Option<Vec<String>>,
}

impl ReviewChanges {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.title.is_none() && self.content.is_none() && self.pros.is_none() && self.cons.is_none()
    }
    pub fn touches_rating(&self) -> bool { self.rating.is_some() }
}

impl Review {
    pub fn create(new: NewReview) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), product_id: new.product_id, user_id: new.user_id, rating: new.rating,
            title: new.title, content: new.content, pros: new.pros, cons: new.cons,
            verified_purchase: new.verified_purchase, helpful_votes: 0,
            created_at: now, updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: ReviewChanges) {
        if let Some(rating) = changes.rating { self.rating = rating; }
        if let Some(title) = changes.title { self.title = title; }
        if let Some(content) = changes.content { self.content = content; }
        if let Some(pros) = changes.pros { self.pros = pros; }
        if let Some(cons) = changes.cons { self.cons = cons; }
        self.updated_at = Utc::now();
    }

    pub fn has_pros_and_cons(&self) -> bool { !self.pros.is_empty() && !self.cons.is_empty() }

    pub fn upvote(&mut self) { self.helpful_votes = self.helpful_votes.saturating_add(1); }

    pub fn downvote(&mut self) -> Result<(), ReviewError> {
        self.helpful_votes = self.helpful_votes.checked_sub(1).ok_or(ReviewError::HelpfulVotesBelowZero)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ReviewError { HelpfulVotesBelowZero }
impl std::error::Error for ReviewError {}
impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Helpful votes cannot go below 0") }
}

/// Aggregate view over every review of one product.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatistics {
    pub total_reviews: u64,
    pub average_rating: f64,
    pub rating_distribution: RatingDistribution,
    pub rating_percentages: BTreeMap<u8, f64>,
    pub verified_purchases: u64,
}

impl ReviewStatistics {
    pub fn from_reviews<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let mut distribution = RatingDistribution::default();
        let (mut sum, mut verified) = (0u64, 0u64);
        for review in reviews {
            distribution.record(review.rating);
            sum += u64::from(review.rating.value());
            if review.verified_purchase { verified += 1; }
        }
        let total = distribution.total();
        let average_rating = if total == 0 { 0.0 } else { round_one_decimal(sum as f64 / total as f64) };
        let rating_percentages = distribution
            .iter()
            .map(|(stars, count)| {
                let pct = if total == 0 { 0.0 } else { round_one_decimal(count as f64 * 100.0 / total as f64) };
                (stars, pct)
            })
            .collect();
        Self { total_reviews: total, average_rating, rating_distribution: distribution, rating_percentages, verified_purchases: verified }
    }

    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            average_rating: self.average_rating,
            total_reviews: self.total_reviews,
            rating_distribution: self.rating_distribution,
        }
    }
}

pub fn round_one_decimal(value: f64) -> f64 { (value * 10.0).round() / 10.0 }
