use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::error::ApiResult;
use super::extract::{trimmed, trimmed_opt, Path, ValidatedJson, ValidatedQuery};
use super::AppState;
use crate::domain::query::{PageRequest, Pagination};
use crate::domain::{NewUser, UserChanges};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"), custom = "username_chars")]
    pub username: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 50, message = "First name must be between 2 and 50 characters"))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters"))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 50, message = "First name must be between 2 and 50 characters"))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters"))]
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListParams {
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

fn username_chars(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Ok(());
    }
    let mut err = ValidationError::new("username");
    err.message = Some("Username may only contain letters, numbers and underscores".into());
    Err(err)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

async fn list_users(State(s): State<AppState>, ValidatedQuery(p): ValidatedQuery<ListParams>) -> ApiResult<Json<Value>> {
    let request = PageRequest::new(p.page, p.limit);
    let page = s.users.list(&request).await?;
    Ok(Json(json!({ "users": page.items, "pagination": Pagination::new(page.total, &request) })))
}

async fn get_user(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    Ok(Json(json!(s.users.get(id).await?)))
}

async fn create_user(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<CreateUserRequest>) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = s
        .users
        .create(NewUser { username: r.username, email: r.email.to_lowercase(), first_name: r.first_name, last_name: r.last_name })
        .await?;
    Ok((StatusCode::CREATED, Json(json!(user))))
}

async fn update_user(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<Value>> {
    let changes = UserChanges {
        email: r.email.map(|e| e.to_lowercase()),
        first_name: r.first_name,
        last_name: r.last_name,
        is_active: r.is_active,
    };
    Ok(Json(json!(s.users.update(id, changes).await?)))
}

async fn delete_user(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    s.users.delete(id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
