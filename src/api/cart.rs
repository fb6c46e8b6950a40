use axum::{
    extract::State,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::error::ApiResult;
use super::extract::{Path, ValidatedJson};
use super::AppState;
use crate::domain::Quantity;
use crate::TechMarketError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add_to_cart))
        .route("/user/:user_id", get(get_cart))
        .route("/user/full/:user_id", get(get_full_cart))
        .route("/:cart_id/product/:product_id", patch(update_item).delete(remove_item))
        .route("/:cart_id", delete(delete_cart))
}

async fn add_to_cart(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<AddToCartRequest>) -> ApiResult<Json<Value>> {
    let quantity = Quantity::new(r.quantity).map_err(TechMarketError::from)?;
    let (cart, outcome) = s.carts.add_item(r.user_id, r.product_id, quantity).await?;
    Ok(Json(json!({ "message": outcome.message(), "cart": cart })))
}

async fn get_cart(State(s): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let items = s.carts.get_cart(user_id).await?;
    Ok(Json(json!({ "userId": user_id, "items": items })))
}

async fn get_full_cart(State(s): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let cart = s.carts.get_full_cart(user_id).await?;
    Ok(Json(json!(cart)))
}

async fn update_item(
    State(s): State<AppState>,
    Path((cart_id, product_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(r): ValidatedJson<UpdateQuantityRequest>,
) -> ApiResult<Json<Value>> {
    let quantity = Quantity::new(r.quantity).map_err(TechMarketError::from)?;
    let cart = s.carts.set_item_quantity(cart_id, product_id, quantity).await?;
    Ok(Json(json!({ "message": "Cart item updated successfully", "cart": cart })))
}

async fn remove_item(State(s): State<AppState>, Path((cart_id, product_id)): Path<(Uuid, Uuid)>) -> ApiResult<Json<Value>> {
    let cart = s.carts.remove_item(cart_id, product_id).await?;
    Ok(Json(json!({ "message": "Product removed from cart successfully", "cart": cart })))
}

async fn delete_cart(State(s): State<AppState>, Path(cart_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    s.carts.delete_cart(cart_id).await?;
    Ok(Json(json!({ "message": "Cart deleted successfully" })))
}
