//! Filtering, sorting and pagination shared by the list endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;
use crate::domain::aggregates::{Product, Review};
use crate::domain::value_objects::Rating;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder { Asc, #[default] Desc }

impl SortOrder {
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self { Self::Asc => ordering, Self::Desc => ordering.reverse() }
    }
    pub fn as_sql(&self) -> &'static str {
        match self { Self::Asc => "ASC", Self::Desc => "DESC" }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest { pub page: u32, pub limit: u32 }

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }
    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for PageRequest { fn default() -> Self { Self::new(None, None) } }

/// One page of results plus the unpaginated match count.
#[derive(Clone, Debug)]
pub struct Page<T> { pub items: Vec<T>, pub total: u64 }

impl<T> Page<T> {
    /// Slices an already filtered and sorted list.
    pub fn from_sorted(items: Vec<T>, request: &PageRequest) -> Self {
        let total = items.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = items.into_iter().skip(offset).take(request.limit as usize).collect();
        Self { items, total }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(total: u64, request: &PageRequest) -> Self {
        let total_pages = total.div_ceil(u64::from(request.limit));
        Self {
            total, page: request.page, limit: request.limit, total_pages,
            has_next: u64::from(request.page) < total_pages,
            has_prev: request.page > 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewSortField { Rating, #[default] CreatedAt, HelpfulVotes, Title }

impl ReviewSortField {
    pub fn compare(&self, a: &Review, b: &Review) -> Ordering {
        match self {
            Self::Rating => a.rating.cmp(&b.rating),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::HelpfulVotes => a.helpful_votes.cmp(&b.helpful_votes),
            Self::Title => a.title.cmp(&b.title),
        }
    }
    pub fn column(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::CreatedAt => "created_at",
            Self::HelpfulVotes => "helpful_votes",
            Self::Title => "title",
        }
    }
}

/// Conjunction of optional review predicates; an empty filter matches everything.
#[derive(Clone, Debug, Default)]
pub struct ReviewFilter {
    pub product_id: Option<Uuid>,
    pub text: Option<String>,
    pub min_rating: Option<Rating>,
    pub max_rating: Option<Rating>,
    pub verified_purchase: Option<bool>,
    pub has_pros_cons: bool,
}

impl ReviewFilter {
    pub fn for_product(product_id: Uuid) -> Self { Self { product_id: Some(product_id), ..Default::default() } }

    pub fn matches(&self, review: &Review) -> bool {
        if self.product_id.is_some_and(|p| p != review.product_id) { return false; }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !review.title.to_lowercase().contains(&needle) && !review.content.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if self.min_rating.is_some_and(|min| review.rating < min) { return false; }
        if self.max_rating.is_some_and(|max| review.rating > max) { return false; }
        if self.verified_purchase.is_some_and(|v| v != review.verified_purchase) { return false; }
        !self.has_pros_cons || review.has_pros_and_cons()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReviewQuery {
    pub filter: ReviewFilter,
    pub sort_by: ReviewSortField,
    pub sort_order: SortOrder,
    pub page: PageRequest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSortField { Name, Price, #[default] CreatedAt, AverageRating }

impl ProductSortField {
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Name => a.name.cmp(&b.name),
            Self::Price => a.price.cmp(&b.price),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::AverageRating => a.rating().average_rating.total_cmp(&b.rating().average_rating),
        }
    }
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::CreatedAt => "created_at",
            Self::AverageRating => "average_rating",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub attribute: Option<(String, String)>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if self.category_id.is_some_and(|c| product.category_id != Some(c)) { return false; }
        if self.min_price.is_some_and(|min| product.price < min) { return false; }
        if self.max_price.is_some_and(|max| product.price > max) { return false; }
        match &self.attribute {
            Some((name, value)) => product.attribute_matches(name, value),
            None => true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub sort_by: ProductSortField,
    pub sort_order: SortOrder,
    pub page: PageRequest,
}
