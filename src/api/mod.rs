//! HTTP surface: router assembly and shared handler state.

pub mod cart;
pub mod categories;
pub mod error;
pub mod extract;
pub mod products;
pub mod reviews;
pub mod users;

use axum::{http::{StatusCode, Uri}, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{CartStore, Catalog, ReviewAggregator, UserDirectory};
use crate::storage::Store;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub carts: CartStore,
    pub reviews: ReviewAggregator,
    pub catalog: Catalog,
    pub users: UserDirectory,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        let reviews = ReviewAggregator::new(&store);
        Self {
            carts: CartStore::new(&store),
            catalog: Catalog::new(&store, reviews.clone()),
            reviews,
            users: UserDirectory::new(&store),
        }
    }
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy", "service": "techmarket-api" })) }))
        .nest("/api/cart", cart::routes())
        .nest("/api/reviews", reviews::routes())
        .nest("/api/products", products::routes())
        .nest("/api/categories", categories::routes())
        .nest("/api/users", users::routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "message": format!("Not Found - {}", uri.path()) })))
}
