use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::error::ApiResult;
use super::extract::{trimmed, trimmed_opt, Path, ValidatedJson, ValidatedQuery};
use super::AppState;
use crate::domain::query::{PageRequest, Pagination, ProductFilter, ProductQuery, ProductSortField, SortOrder};
use crate::domain::{NewProduct, ProductChanges};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(custom = "check_price")]
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    #[validate(custom = "check_attributes")]
    pub attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(custom = "check_price")]
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    #[validate(custom = "check_attributes")]
    pub attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePriceRequest {
    #[validate(custom = "check_price")]
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub category_id: Option<Uuid>,
    #[validate(custom = "check_price")]
    pub min_price: Option<Decimal>,
    #[validate(custom = "check_price")]
    pub max_price: Option<Decimal>,
    pub sort_by: Option<ProductSortField>,
    pub sort_order: Option<SortOrder>,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttributeParams {
    #[validate(length(min = 1, message = "Attribute name is required"))]
    pub name: String,
    pub value: String,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Non-negative with at most two decimal places.
fn check_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(invalid("price", "Price must be a positive number"));
    }
    if value.normalize().scale() > 2 {
        return Err(invalid("price", "Price can have at most two decimal places"));
    }
    Ok(())
}

/// Attribute values are short strings, numbers or booleans.
fn check_attributes(map: &Map<String, Value>) -> Result<(), ValidationError> {
    let ok = map.values().all(|v| match v {
        Value::String(s) => s.chars().count() <= 200,
        Value::Number(_) | Value::Bool(_) => true,
        _ => false,
    });
    if ok { Ok(()) } else { Err(invalid("attributes", "Attribute values must be strings, numbers or booleans")) }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search/attribute", get(search_by_attribute))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/price", patch(update_price))
}

async fn list_products(State(s): State<AppState>, ValidatedQuery(p): ValidatedQuery<ListParams>) -> ApiResult<Json<Value>> {
    let query = ProductQuery {
        filter: ProductFilter { category_id: p.category_id, min_price: p.min_price, max_price: p.max_price, attribute: None },
        sort_by: p.sort_by.unwrap_or_default(),
        sort_order: p.sort_order.unwrap_or_default(),
        page: PageRequest::new(p.page, p.limit),
    };
    let page = s.catalog.list_products(&query).await?;
    Ok(Json(json!({ "products": page.items, "pagination": Pagination::new(page.total, &query.page) })))
}

async fn search_by_attribute(State(s): State<AppState>, ValidatedQuery(p): ValidatedQuery<AttributeParams>) -> ApiResult<Json<Value>> {
    let query = ProductQuery {
        filter: ProductFilter { attribute: Some((p.name, p.value)), ..Default::default() },
        page: PageRequest::new(p.page, p.limit),
        ..Default::default()
    };
    let page = s.catalog.list_products(&query).await?;
    Ok(Json(json!({ "products": page.items, "pagination": Pagination::new(page.total, &query.page) })))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let product = s.catalog.get_product(id).await?;
    Ok(Json(json!(product)))
}

async fn create_product(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<CreateProductRequest>) -> ApiResult<(StatusCode, Json<Value>)> {
    let product = s
        .catalog
        .create_product(NewProduct {
            name: r.name,
            price: r.price,
            category_id: r.category_id,
            attributes: r.attributes.unwrap_or_default(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!(product))))
}

async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<UpdateProductRequest>,
) -> ApiResult<Json<Value>> {
    let changes = ProductChanges { name: r.name, price: r.price, category_id: r.category_id, attributes: r.attributes };
    let product = s.catalog.update_product(id, changes).await?;
    Ok(Json(json!(product)))
}

async fn update_price(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<UpdatePriceRequest>,
) -> ApiResult<Json<Value>> {
    let changes = ProductChanges { price: Some(r.price), ..Default::default() };
    let product = s.catalog.update_product(id, changes).await?;
    Ok(Json(json!(product)))
}

async fn delete_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let reviews_deleted = s.catalog.delete_product(id).await?;
    Ok(Json(json!({
        "message": "Product and its reviews deleted successfully",
        "productId": id,
        "reviewsDeleted": reviews_deleted,
    })))
}
