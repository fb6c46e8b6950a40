use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::error::ApiResult;
use super::extract::{trimmed, trimmed_opt, Path, ValidatedJson};
use super::AppState;
use crate::domain::CategoryChanges;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/products/:id", get(category_products))
        .route("/:id", get(get_category).patch(update_category).delete(delete_category))
}

async fn list_categories(State(s): State<AppState>) -> ApiResult<Json<Value>> {
    let categories = s.catalog.list_categories().await?;
    Ok(Json(json!({ "categories": categories })))
}

async fn get_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    Ok(Json(json!(s.catalog.get_category(id).await?)))
}

async fn category_products(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    Ok(Json(json!(s.catalog.category_with_products(id).await?)))
}

async fn create_category(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<CreateCategoryRequest>) -> ApiResult<(StatusCode, Json<Value>)> {
    let category = s.catalog.create_category(r.name, r.description).await?;
    Ok((StatusCode::CREATED, Json(json!(category))))
}

async fn update_category(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<Json<Value>> {
    let category = s.catalog.update_category(id, CategoryChanges { name: r.name, description: r.description }).await?;
    Ok(Json(json!(category)))
}

async fn delete_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    s.catalog.delete_category(id).await?;
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}
