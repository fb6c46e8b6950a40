//! Review Aggregator: owns review records and the rating summary stored on
//! each product.
//!
//! The summary is always recomputed from the full review set of the product
//! and written in a single repository call; it is never adjusted
//! incrementally.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::query::{Page, ReviewQuery};
use crate::domain::{NewReview, Review, ReviewChanges, ReviewStatistics};
use crate::services::locks::KeyedLocks;
use crate::storage::{ProductRepository, ReviewRepository, Store};
use crate::{Result, TechMarketError};

#[derive(Clone)]
pub struct ReviewAggregator {
    reviews: Arc<dyn ReviewRepository>,
    products: Arc<dyn ProductRepository>,
    review_locks: KeyedLocks,
    product_locks: KeyedLocks,
}

impl ReviewAggregator {
    pub fn new(store: &Store) -> Self {
        Self {
            reviews: store.reviews.clone(),
            products: store.products.clone(),
            review_locks: KeyedLocks::new(),
            product_locks: KeyedLocks::new(),
        }
    }

    pub async fn get_review(&self, id: Uuid) -> Result<Review> {
        self.reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| TechMarketError::not_found("Review not found"))
    }

    #[instrument(skip(self, new), fields(product_id = %new.product_id, rating = new.rating.value()))]
    pub async fn create_review(&self, new: NewReview) -> Result<Review> {
        // Held across the existence check and the insert so a concurrent
        // product delete cannot leave this review orphaned.
        let _guard = self.product_locks.lock(new.product_id).await;
        if self.products.find_by_id(new.product_id).await?.is_none() {
            return Err(TechMarketError::not_found("Product not found"));
        }

        let review = Review::create(new);
        self.reviews.insert(&review).await?;
        info!(review_id = %review.id, "review created");

        self.store_summary(review.product_id).await?;
        Ok(review)
    }

    /// Applies the fields present in `changes`; the summary is recomputed when the rating is among them.
    #[instrument(skip(self, changes))]
    pub async fn update_review(&self, id: Uuid, changes: ReviewChanges) -> Result<Review> {
        if changes.is_empty() {
            return Err(TechMarketError::validation("No changes were made to the review"));
        }
        let resync = changes.touches_rating();

        let guard = self.review_locks.lock(id).await;
        let mut review = self.get_review(id).await?;
        review.apply(changes);
        if !self.reviews.update(&review).await? {
            return Err(TechMarketError::not_found("Review not found"));
        }
        drop(guard);

        if resync {
            self.sync_summary(review.product_id).await?;
        }
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn delete_review(&self, id: Uuid) -> Result<Review> {
        let guard = self.review_locks.lock(id).await;
        let review = self.get_review(id).await?;
        if !self.reviews.delete(id).await? {
            return Err(TechMarketError::not_found("Review not found"));
        }
        drop(guard);
        info!(product_id = %review.product_id, "review deleted");

        self.sync_summary(review.product_id).await?;
        Ok(review)
    }

    /// Adds or removes one helpful vote; removing from zero is refused without a write.
    #[instrument(skip(self))]
    pub async fn set_helpful_votes(&self, id: Uuid, increment: bool) -> Result<Review> {
        let _guard = self.review_locks.lock(id).await;
        let mut review = self.get_review(id).await?;
        if increment {
            review.upvote();
        } else if let Err(e) = review.downvote() {
            warn!(review_id = %id, "helpful vote decrement refused at zero");
            return Err(e.into());
        }
        if !self.reviews.update(&review).await? {
            return Err(TechMarketError::not_found("Review not found"));
        }
        Ok(review)
    }

    /// Statistics over the current review set of a product; a product with no reviews yields zeros.
    pub async fn statistics(&self, product_id: Uuid) -> Result<ReviewStatistics> {
        let reviews = self.reviews.find_by_product(product_id).await?;
        Ok(ReviewStatistics::from_reviews(&reviews))
    }

    pub async fn search(&self, query: &ReviewQuery) -> Result<Page<Review>> {
        Ok(self.reviews.search(query).await?)
    }

    /// Removes a product together with every review written for it. Returns the number of reviews removed.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<u64> {
        let _guard = self.product_locks.lock(product_id).await;
        if self.products.find_by_id(product_id).await?.is_none() {
            return Err(TechMarketError::not_found("Product not found"));
        }
        let removed = self.reviews.delete_by_product(product_id).await?;
        if !self.products.delete(product_id).await? {
            return Err(TechMarketError::not_found("Product not found"));
        }
        info!(reviews_removed = removed, "product deleted");
        Ok(removed)
    }

    async fn sync_summary(&self, product_id: Uuid) -> Result<ReviewStatistics> {
        let _guard = self.product_locks.lock(product_id).await;
        self.store_summary(product_id).await
    }

    /// Recomputes the product summary from scratch and stores it. Callers hold the product lock.
    async fn store_summary(&self, product_id: Uuid) -> Result<ReviewStatistics> {
        let stats = self.statistics(product_id).await?;
        if self.products.set_rating_summary(product_id, &stats.summary()).await? {
            info!(%product_id, total = stats.total_reviews, average = stats.average_rating, "rating summary recomputed");
        } else {
            warn!(%product_id, "rating summary not stored: product no longer exists");
        }
        Ok(stats)
    }
}
