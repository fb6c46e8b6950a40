//! PostgreSQL backend over a shared `PgPool`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    CartRepository, CategoryRepository, ProductRepository, ReviewRepository, StorageError,
    StorageResult, UserRepository,
};
use crate::domain::query::{Page, PageRequest, ProductFilter, ProductQuery, ReviewFilter, ReviewQuery};
use crate::domain::{Cart, Category, NewProduct, Product, Rating, RatingDistribution, RatingSummary, Review, User};

#[derive(Clone)]
pub struct PgDb {
    pool: PgPool,
}

impl PgDb {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

fn corrupt(what: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Corrupt(format!("{what}: {e}"))
}

fn to_i64(value: u64) -> i64 { i64::try_from(value).unwrap_or(i64::MAX) }

// =============================================================================
// Rows
// =============================================================================

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    product_ids: Vec<Uuid>,
    quantities: Json<BTreeMap<Uuid, u32>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = StorageError;
    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Cart::from_parts(row.id, row.user_id, row.product_ids, row.quantities.0, row.created_at, row.updated_at)
            .map_err(|e| corrupt("cart", e))
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    rating: i16,
    title: String,
    content: String,
    pros: Vec<String>,
    cons: Vec<String>,
    verified_purchase: bool,
    helpful_votes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StorageError;
    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            rating: Rating::new(i64::from(row.rating)).map_err(|e| corrupt("review rating", e))?,
            title: row.title,
            content: row.content,
            pros: row.pros,
            cons: row.cons,
            verified_purchase: row.verified_purchase,
            helpful_votes: u32::try_from(row.helpful_votes).map_err(|e| corrupt("review helpful_votes", e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    category_id: Option<Uuid>,
    attributes: Json<Map<String, Value>>,
    average_rating: f64,
    total_reviews: i64,
    rating_distribution: Json<RatingDistribution>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StorageError;
    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let summary = RatingSummary {
            average_rating: row.average_rating,
            total_reviews: u64::try_from(row.total_reviews).map_err(|e| corrupt("product total_reviews", e))?,
            rating_distribution: row.rating_distribution.0,
        };
        let fields = NewProduct { name: row.name, price: row.price, category_id: row.category_id, attributes: row.attributes.0 };
        Ok(Product::restore(row.id, fields, summary, row.created_at, row.updated_at))
    }
}

fn collect<R, T>(rows: Vec<R>) -> StorageResult<Vec<T>>
where
    T: TryFrom<R, Error = StorageError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// =============================================================================
// Carts
// =============================================================================

#[async_trait]
impl CartRepository for PgDb {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Cart>> {
        sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Cart::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: Uuid) -> StorageResult<Option<Cart>> {
        sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1")
            .bind(user_id).fetch_optional(&self.pool).await?
            .map(Cart::try_from).transpose()
    }

    async fn save(&self, cart: &Cart) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO carts (id, user_id, product_ids, quantities, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET product_ids = EXCLUDED.product_ids, quantities = EXCLUDED.quantities, updated_at = EXCLUDED.updated_at",
        )
        .bind(cart.id()).bind(cart.user_id()).bind(cart.product_ids().to_vec()).bind(Json(cart.quantities().clone()))
        .bind(cart.created_at()).bind(cart.updated_at())
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Reviews
// =============================================================================

fn push_review_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReviewFilter) {
    qb.push(" WHERE TRUE");
    if let Some(product_id) = filter.product_id {
        qb.push(" AND product_id = ").push_bind(product_id);
    }
    if let Some(text) = &filter.text {
        qb.push(" AND (strpos(lower(title), lower(").push_bind(text.clone())
            .push(")) > 0 OR strpos(lower(content), lower(").push_bind(text.clone()).push(")) > 0)");
    }
    if let Some(min) = filter.min_rating {
        qb.push(" AND rating >= ").push_bind(i16::from(min.value()));
    }
    if let Some(max) = filter.max_rating {
        qb.push(" AND rating <= ").push_bind(i16::from(max.value()));
    }
    if let Some(verified) = filter.verified_purchase {
        qb.push(" AND verified_purchase = ").push_bind(verified);
    }
    if filter.has_pros_cons {
        qb.push(" AND cardinality(pros) > 0 AND cardinality(cons) > 0");
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: &PageRequest) {
    qb.push(" LIMIT ").push_bind(i64::from(page.limit)).push(" OFFSET ").push_bind(to_i64(page.offset()));
}

#[async_trait]
impl ReviewRepository for PgDb {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Review>> {
        sqlx::query_as::<_, ReviewRow>("SELECT * FROM reviews WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Review::try_from).transpose()
    }

    async fn find_by_product(&self, product_id: Uuid) -> StorageResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>("SELECT * FROM reviews WHERE product_id = $1 ORDER BY id")
            .bind(product_id).fetch_all(&self.pool).await?;
        collect(rows)
    }

    async fn search(&self, query: &ReviewQuery) -> StorageResult<Page<Review>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reviews");
        push_review_filter(&mut count, &query.filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM reviews");
        push_review_filter(&mut select, &query.filter);
        let dir = query.sort_order.as_sql();
        select.push(format!(" ORDER BY {} {dir}, id {dir}", query.sort_by.column()));
        push_page(&mut select, &query.page);
        let rows = select.build_query_as::<ReviewRow>().fetch_all(&self.pool).await?;

        Ok(Page { items: collect(rows)?, total: u64::try_from(total).unwrap_or(0) })
    }

    async fn insert(&self, review: &Review) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO reviews (id, product_id, user_id, rating, title, content, pros, cons, verified_purchase, helpful_votes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(review.id).bind(review.product_id).bind(review.user_id).bind(i16::from(review.rating.value()))
        .bind(&review.title).bind(&review.content).bind(&review.pros).bind(&review.cons)
        .bind(review.verified_purchase).bind(i32::try_from(review.helpful_votes).unwrap_or(i32::MAX))
        .bind(review.created_at).bind(review.updated_at)
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, review: &Review) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE reviews SET rating = $2, title = $3, content = $4, pros = $5, cons = $6, verified_purchase = $7, helpful_votes = $8, updated_at = $9 WHERE id = $1",
        )
        .bind(review.id).bind(i16::from(review.rating.value())).bind(&review.title).bind(&review.content)
        .bind(&review.pros).bind(&review.cons).bind(review.verified_purchase)
        .bind(i32::try_from(review.helpful_votes).unwrap_or(i32::MAX)).bind(review.updated_at)
        .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_product(&self, product_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE product_id = $1").bind(product_id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Products
// =============================================================================

fn push_product_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some((name, value)) = &filter.attribute {
        qb.push(" AND attributes ->> ").push_bind(name.clone()).push(" = ").push_bind(value.clone());
    }
}

#[async_trait]
impl ProductRepository for PgDb {
    async fn list(&self, query: &ProductQuery) -> StorageResult<Page<Product>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_product_filter(&mut count, &query.filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM products");
        push_product_filter(&mut select, &query.filter);
        let dir = query.sort_order.as_sql();
        select.push(format!(" ORDER BY {} {dir}, id {dir}", query.sort_by.column()));
        push_page(&mut select, &query.page);
        let rows = select.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;

        Ok(Page { items: collect(rows)?, total: u64::try_from(total).unwrap_or(0) })
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> StorageResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids.to_vec()).fetch_all(&self.pool).await?;
        collect(rows)
    }

    async fn find_by_category(&self, category_id: Uuid) -> StorageResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE category_id = $1 ORDER BY id")
            .bind(category_id).fetch_all(&self.pool).await?;
        collect(rows)
    }

    async fn insert(&self, product: &Product) -> StorageResult<()> {
        let summary = product.rating();
        sqlx::query(
            "INSERT INTO products (id, name, price, category_id, attributes, average_rating, total_reviews, rating_distribution, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(product.id).bind(&product.name).bind(product.price).bind(product.category_id)
        .bind(Json(product.attributes.clone())).bind(summary.average_rating).bind(to_i64(summary.total_reviews))
        .bind(Json(summary.rating_distribution)).bind(product.created_at).bind(product.updated_at)
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, price = $3, category_id = $4, attributes = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(product.id).bind(&product.name).bind(product.price).bind(product.category_id)
        .bind(Json(product.attributes.clone())).bind(product.updated_at)
        .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_rating_summary(&self, id: Uuid, summary: &RatingSummary) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET average_rating = $2, total_reviews = $3, rating_distribution = $4 WHERE id = $1",
        )
        .bind(id).bind(summary.average_rating).bind(to_i64(summary.total_reviews)).bind(Json(summary.rating_distribution))
        .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Categories
// =============================================================================

#[async_trait]
impl CategoryRepository for PgDb {
    async fn list(&self) -> StorageResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert(&self, category: &Category) -> StorageResult<()> {
        sqlx::query("INSERT INTO categories (id, name, description, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(category.id).bind(&category.name).bind(&category.description)
            .bind(category.created_at).bind(category.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, category: &Category) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE categories SET name = $2, description = $3, updated_at = $4 WHERE id = $1")
            .bind(category.id).bind(&category.name).bind(&category.description).bind(category.updated_at)
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserRepository for PgDb {
    async fn list(&self, page: &PageRequest) -> StorageResult<Page<User>> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users").fetch_one(&self.pool).await?;
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2")
            .bind(i64::from(page.limit)).bind(to_i64(page.offset()))
            .fetch_all(&self.pool).await?;
        Ok(Page { items: users, total: u64::try_from(total).unwrap_or(0) })
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)").bind(email).fetch_optional(&self.pool).await?)
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1").bind(username).fetch_optional(&self.pool).await?)
    }

    async fn insert(&self, user: &User) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, first_name, last_name, is_active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id).bind(&user.username).bind(&user.email).bind(&user.first_name).bind(&user.last_name)
        .bind(user.is_active).bind(user.created_at).bind(user.updated_at)
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, user: &User) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, first_name = $3, last_name = $4, is_active = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(user.id).bind(&user.email).bind(&user.first_name).bind(&user.last_name)
        .bind(user.is_active).bind(user.updated_at)
        .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
