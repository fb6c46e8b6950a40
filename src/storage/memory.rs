//! In-memory backend. Every record kind lives in its own `DashMap`; shard
//! guards are never held across an await point.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{
    CartRepository, CategoryRepository, ProductRepository, ReviewRepository, StorageResult,
    UserRepository,
};
use crate::domain::query::{Page, PageRequest, ProductQuery, ReviewQuery};
use crate::domain::{Cart, Category, Product, RatingSummary, Review, User};

#[derive(Default)]
pub struct MemoryDb {
    carts: DashMap<Uuid, Cart>,
    reviews: DashMap<Uuid, Review>,
    products: DashMap<Uuid, Product>,
    categories: DashMap<Uuid, Category>,
    users: DashMap<Uuid, User>,
}

fn replace<T: Clone>(map: &DashMap<Uuid, T>, id: Uuid, value: &T) -> bool {
    match map.get_mut(&id) {
        Some(mut entry) => {
            *entry = value.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl CartRepository for MemoryDb {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Cart>> {
        Ok(self.carts.get(&id).map(|c| c.clone()))
    }

    async fn find_by_user(&self, user_id: Uuid) -> StorageResult<Option<Cart>> {
        Ok(self.carts.iter().find(|c| c.user_id() == user_id).map(|c| c.clone()))
    }

    async fn save(&self, cart: &Cart) -> StorageResult<()> {
        self.carts.insert(cart.id(), cart.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.carts.remove(&id).is_some())
    }
}

#[async_trait]
impl ReviewRepository for MemoryDb {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Review>> {
        Ok(self.reviews.get(&id).map(|r| r.clone()))
    }

    async fn find_by_product(&self, product_id: Uuid) -> StorageResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self.reviews.iter().filter(|r| r.product_id == product_id).map(|r| r.clone()).collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn search(&self, query: &ReviewQuery) -> StorageResult<Page<Review>> {
        let mut matched: Vec<Review> = self.reviews.iter().filter(|r| query.filter.matches(r)).map(|r| r.clone()).collect();
        matched.sort_by(|a, b| query.sort_order.apply(query.sort_by.compare(a, b).then_with(|| a.id.cmp(&b.id))));
        Ok(Page::from_sorted(matched, &query.page))
    }

    async fn insert(&self, review: &Review) -> StorageResult<()> {
        self.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn update(&self, review: &Review) -> StorageResult<bool> {
        Ok(replace(&self.reviews, review.id, review))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.reviews.remove(&id).is_some())
    }

    async fn delete_by_product(&self, product_id: Uuid) -> StorageResult<u64> {
        // Counted inside retain; a len() difference races with concurrent inserts.
        let mut removed = 0u64;
        self.reviews.retain(|_, r| {
            let keep = r.product_id != product_id;
            if !keep { removed += 1; }
            keep
        });
        Ok(removed)
    }
}

#[async_trait]
impl ProductRepository for MemoryDb {
    async fn list(&self, query: &ProductQuery) -> StorageResult<Page<Product>> {
        let mut matched: Vec<Product> = self.products.iter().filter(|p| query.filter.matches(p)).map(|p| p.clone()).collect();
        matched.sort_by(|a, b| query.sort_order.apply(query.sort_by.compare(a, b).then_with(|| a.id.cmp(&b.id))));
        Ok(Page::from_sorted(matched, &query.page))
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Product>> {
        Ok(self.products.get(&id).map(|p| p.clone()))
    }

    async fn find_many(&self, ids: &[Uuid]) -> StorageResult<Vec<Product>> {
        Ok(ids.iter().filter_map(|id| self.products.get(id).map(|p| p.clone())).collect())
    }

    async fn find_by_category(&self, category_id: Uuid) -> StorageResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.iter().filter(|p| p.category_id == Some(category_id)).map(|p| p.clone()).collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn insert(&self, product: &Product) -> StorageResult<()> {
        self.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> StorageResult<bool> {
        match self.products.get_mut(&product.id) {
            Some(mut entry) => {
                let stored = entry.rating().clone();
                *entry = product.clone().with_rating(stored);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.products.remove(&id).is_some())
    }

    async fn set_rating_summary(&self, id: Uuid, summary: &RatingSummary) -> StorageResult<bool> {
        match self.products.get_mut(&id) {
            Some(mut entry) => {
                *entry = entry.clone().with_rating(summary.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CategoryRepository for MemoryDb {
    async fn list(&self) -> StorageResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.categories.iter().map(|c| c.clone()).collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Category>> {
        Ok(self.categories.get(&id).map(|c| c.clone()))
    }

    async fn insert(&self, category: &Category) -> StorageResult<()> {
        self.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update(&self, category: &Category) -> StorageResult<bool> {
        Ok(replace(&self.categories, category.id, category))
    }

    /// Products in the category keep existing with no category, as with `ON DELETE SET NULL`.
    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        if self.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for mut product in self.products.iter_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn list(&self, page: &PageRequest) -> StorageResult<Page<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(Page::from_sorted(users, page))
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.username == username).map(|u| u.clone()))
    }

    async fn insert(&self, user: &User) -> StorageResult<()> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> StorageResult<bool> {
        Ok(replace(&self.users, user.id, user))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.users.remove(&id).is_some())
    }
}
