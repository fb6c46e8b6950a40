//! Persistence traits and the two storage backends.
//!
//! Services only talk to the `*Repository` traits; `Store` bundles one
//! implementation of each so the whole service can be switched between the
//! in-memory backend and PostgreSQL at startup.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::query::{Page, PageRequest, ProductQuery, ReviewQuery};
use crate::domain::{Cart, Category, Product, RatingSummary, Review, User};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Cart>>;
    async fn find_by_user(&self, user_id: Uuid) -> StorageResult<Option<Cart>>;
    /// Inserts or replaces the whole cart record.
    async fn save(&self, cart: &Cart) -> StorageResult<()>;
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Review>>;
    async fn find_by_product(&self, product_id: Uuid) -> StorageResult<Vec<Review>>;
    async fn search(&self, query: &ReviewQuery) -> StorageResult<Page<Review>>;
    async fn insert(&self, review: &Review) -> StorageResult<()>;
    async fn update(&self, review: &Review) -> StorageResult<bool>;
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;
    async fn delete_by_product(&self, product_id: Uuid) -> StorageResult<u64>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self, query: &ProductQuery) -> StorageResult<Page<Product>>;
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Product>>;
    async fn find_many(&self, ids: &[Uuid]) -> StorageResult<Vec<Product>>;
    async fn find_by_category(&self, category_id: Uuid) -> StorageResult<Vec<Product>>;
    async fn insert(&self, product: &Product) -> StorageResult<()>;
    /// Writes catalog fields only; the rating summary is left as stored.
    async fn update(&self, product: &Product) -> StorageResult<bool>;
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;
    /// Overwrites all summary fields in one write.
    async fn set_rating_summary(&self, id: Uuid, summary: &RatingSummary) -> StorageResult<bool>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> StorageResult<Vec<Category>>;
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Category>>;
    async fn insert(&self, category: &Category) -> StorageResult<()>;
    async fn update(&self, category: &Category) -> StorageResult<bool>;
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self, page: &PageRequest) -> StorageResult<Page<User>>;
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    async fn insert(&self, user: &User) -> StorageResult<()>;
    async fn update(&self, user: &User) -> StorageResult<bool>;
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;
}

#[derive(Clone)]
pub struct Store {
    pub carts: Arc<dyn CartRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Store {
    pub fn memory() -> Self {
        let db = Arc::new(memory::MemoryDb::default());
        Self {
            carts: db.clone(),
            reviews: db.clone(),
            products: db.clone(),
            categories: db.clone(),
            users: db,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let db = Arc::new(postgres::PgDb::new(pool));
        Self {
            carts: db.clone(),
            reviews: db.clone(),
            products: db.clone(),
            categories: db.clone(),
            users: db,
        }
    }
}
