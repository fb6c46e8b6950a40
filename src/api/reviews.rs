use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::error::ApiResult;
use super::extract::{trimmed, trimmed_list, trimmed_opt, Path, ValidatedJson, ValidatedQuery};
use super::AppState;
use crate::domain::query::{PageRequest, Pagination, ReviewFilter, ReviewQuery, ReviewSortField, SortOrder};
use crate::domain::{NewReview, Rating, ReviewChanges};
use crate::TechMarketError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub user_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 10, max = 1000, message = "Content must be between 10 and 1000 characters"))]
    pub content: String,
    #[serde(default, deserialize_with = "trimmed_list")]
    #[validate(length(max = 10, message = "At most 10 pros are allowed"), custom = "pros_cons_items")]
    pub pros: Option<Vec<String>>,
    #[serde(default, deserialize_with = "trimmed_list")]
    #[validate(length(max = 10, message = "At most 10 cons are allowed"), custom = "pros_cons_items")]
    pub cons: Option<Vec<String>>,
    #[serde(default)]
    pub verified_purchase: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i64>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 10, max = 1000, message = "Content must be between 10 and 1000 characters"))]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "trimmed_list")]
    #[validate(length(max = 10, message = "At most 10 pros are allowed"), custom = "pros_cons_items")]
    pub pros: Option<Vec<String>>,
    #[serde(default, deserialize_with = "trimmed_list")]
    #[validate(length(max = 10, message = "At most 10 cons are allowed"), custom = "pros_cons_items")]
    pub cons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HelpfulVoteRequest {
    pub increment: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub product_id: Option<Uuid>,
    #[validate(range(min = 1, max = 5, message = "minRating must be between 1 and 5"))]
    pub min_rating: Option<i64>,
    #[validate(range(min = 1, max = 5, message = "maxRating must be between 1 and 5"))]
    pub max_rating: Option<i64>,
    pub verified_purchase: Option<bool>,
    pub has_pros_cons: Option<bool>,
    pub sort_by: Option<ReviewSortField>,
    pub sort_order: Option<SortOrder>,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub sort_by: Option<ReviewSortField>,
    pub sort_order: Option<SortOrder>,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

#[allow(clippy::ptr_arg)]
fn pros_cons_items(items: &Vec<String>) -> Result<(), ValidationError> {
    if items.iter().all(|s| (2..=100).contains(&s.chars().count())) {
        return Ok(());
    }
    let mut err = ValidationError::new("item_length");
    err.message = Some("Each pro and con must be between 2 and 100 characters".into());
    Err(err)
}

fn optional_rating(value: Option<i64>) -> ApiResult<Option<Rating>> {
    Ok(value.map(Rating::new).transpose().map_err(TechMarketError::from)?)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_review))
        .route("/search", get(search_reviews))
        .route("/product/:product_id", get(product_reviews))
        .route("/product/:product_id/stats", get(product_stats))
        .route("/:id", get(get_review).put(update_review).patch(update_review).delete(delete_review))
        .route("/:id/helpful", patch(helpful_vote))
}

async fn create_review(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<CreateReviewRequest>) -> ApiResult<(StatusCode, Json<Value>)> {
    let review = s
        .reviews
        .create_review(NewReview {
            product_id: r.product_id,
            user_id: r.user_id,
            rating: Rating::new(r.rating).map_err(TechMarketError::from)?,
            title: r.title,
            content: r.content,
            pros: r.pros.unwrap_or_default(),
            cons: r.cons.unwrap_or_default(),
            verified_purchase: r.verified_purchase,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Review created successfully", "reviewId": review.id, "review": review })),
    ))
}

async fn get_review(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let review = s.reviews.get_review(id).await?;
    Ok(Json(json!(review)))
}

async fn update_review(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<UpdateReviewRequest>,
) -> ApiResult<Json<Value>> {
    let changes = ReviewChanges {
        rating: optional_rating(r.rating)?,
        title: r.title,
        content: r.content,
        pros: r.pros,
        cons: r.cons,
    };
    let review = s.reviews.update_review(id, changes).await?;
    Ok(Json(json!({ "message": "Review updated successfully", "review": review })))
}

async fn delete_review(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let review = s.reviews.delete_review(id).await?;
    Ok(Json(json!({ "message": "Review deleted successfully", "reviewId": review.id })))
}

async fn helpful_vote(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<HelpfulVoteRequest>,
) -> ApiResult<Json<Value>> {
    let review = s.reviews.set_helpful_votes(id, r.increment).await?;
    let message = if r.increment { "Review upvoted successfully" } else { "Review downvoted successfully" };
    Ok(Json(json!({ "message": message, "helpfulVotes": review.helpful_votes })))
}

async fn product_stats(State(s): State<AppState>, Path(product_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let stats = s.reviews.statistics(product_id).await?;
    Ok(Json(json!(stats)))
}

async fn product_reviews(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    ValidatedQuery(p): ValidatedQuery<ListParams>,
) -> ApiResult<Json<Value>> {
    let query = ReviewQuery {
        filter: ReviewFilter::for_product(product_id),
        sort_by: p.sort_by.unwrap_or_default(),
        sort_order: p.sort_order.unwrap_or_default(),
        page: PageRequest::new(p.page, p.limit),
    };
    let page = s.reviews.search(&query).await?;
    Ok(Json(json!({ "reviews": page.items, "pagination": Pagination::new(page.total, &query.page) })))
}

async fn search_reviews(State(s): State<AppState>, ValidatedQuery(p): ValidatedQuery<SearchParams>) -> ApiResult<Json<Value>> {
    let text = p.query.as_deref().map(str::trim).filter(|q| !q.is_empty()).map(str::to_owned);
    let query = ReviewQuery {
        filter: ReviewFilter {
            product_id: p.product_id,
            text: text.clone(),
            min_rating: optional_rating(p.min_rating)?,
            max_rating: optional_rating(p.max_rating)?,
            verified_purchase: p.verified_purchase,
            has_pros_cons: p.has_pros_cons.unwrap_or(false),
        },
        sort_by: p.sort_by.unwrap_or_default(),
        sort_order: p.sort_order.unwrap_or_default(),
        page: PageRequest::new(p.page, p.limit),
    };
    let page = s.reviews.search(&query).await?;

    Ok(Json(json!({
        "reviews": page.items,
        "pagination": Pagination::new(page.total, &query.page),
        "filters": {
            "query": text,
            "productId": p.product_id,
            "minRating": p.min_rating,
            "maxRating": p.max_rating,
            "verifiedPurchase": p.verified_purchase,
            "hasProsCons": query.filter.has_pros_cons,
            "sortBy": query.sort_by,
            "sortOrder": query.sort_order,
        },
    })))
}
