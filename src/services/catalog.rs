//! Products and categories.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::query::{Page, ProductQuery};
use crate::domain::{Category, CategoryChanges, NewProduct, Product, ProductChanges};
use crate::services::ReviewAggregator;
use crate::storage::{CategoryRepository, ProductRepository, Store};
use crate::{Result, TechMarketError};

#[derive(Clone, Debug, Serialize)]
pub struct CategoryWithProducts {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

#[derive(Clone)]
pub struct Catalog {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
    reviews: ReviewAggregator,
}

impl Catalog {
    /// `reviews` must be the aggregator the rest of the service uses, so product
    /// deletes and review writes share the same per-product locks.
    pub fn new(store: &Store, reviews: ReviewAggregator) -> Self {
        Self {
            products: store.products.clone(),
            categories: store.categories.clone(),
            reviews,
        }
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        Ok(self.products.list(query).await?)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| TechMarketError::not_found("Product not found"))
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        if let Some(category_id) = new.category_id {
            self.require_category(category_id).await?;
        }
        let product = Product::create(new);
        self.products.insert(&product).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Partial update of catalog fields. The stored rating summary is never touched here.
    #[instrument(skip(self, changes))]
    pub async fn update_product(&self, id: Uuid, changes: ProductChanges) -> Result<Product> {
        if changes.is_empty() {
            return Err(TechMarketError::validation("No changes were made to the product"));
        }
        if let Some(category_id) = changes.category_id {
            self.require_category(category_id).await?;
        }
        let mut product = self.get_product(id).await?;
        product.apply(changes);
        if !self.products.update(&product).await? {
            return Err(TechMarketError::not_found("Product not found"));
        }
        // Re-read so the response carries the summary as stored, not as loaded.
        self.get_product(id).await
    }

    /// Removes a product and every review written for it, through the review aggregator.
    pub async fn delete_product(&self, id: Uuid) -> Result<u64> {
        self.reviews.delete_product(id).await
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.list().await?)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| TechMarketError::not_found("Category not found"))
    }

    pub async fn category_with_products(&self, id: Uuid) -> Result<CategoryWithProducts> {
        let category = self.get_category(id).await?;
        let products = self.products.find_by_category(id).await?;
        Ok(CategoryWithProducts { category, products })
    }

    #[instrument(skip(self, description))]
    pub async fn create_category(&self, name: String, description: Option<String>) -> Result<Category> {
        let category = Category::create(name, description);
        self.categories.insert(&category).await?;
        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> Result<Category> {
        let mut category = self.get_category(id).await?;
        category.apply(changes);
        if !self.categories.update(&category).await? {
            return Err(TechMarketError::not_found("Category not found"));
        }
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        if !self.categories.delete(id).await? {
            return Err(TechMarketError::not_found("Category not found"));
        }
        info!("category deleted");
        Ok(())
    }

    async fn require_category(&self, id: Uuid) -> Result<()> {
        match self.categories.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(TechMarketError::not_found("Category not found")),
        }
    }
}
