use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::TechMarketError;

/// Everything a handler can fail with. Each variant renders as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] TechMarketError),

    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),

    #[error("{}", .0.body_text())]
    Query(#[from] QueryRejection),

    #[error("{}", .0.body_text())]
    Path(#[from] PathRejection),

    #[error("{}", validation_message(.0))]
    Invalid(#[from] ValidationErrors),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(e) => match e {
                TechMarketError::Validation(_) | TechMarketError::StateConflict(_) => StatusCode::BAD_REQUEST,
                TechMarketError::NotFound(_) => StatusCode::NOT_FOUND,
                TechMarketError::Conflict(_) => StatusCode::CONFLICT,
                TechMarketError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Body(_) | ApiError::Query(_) | ApiError::Path(_) | ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            format!("Internal server error: {self}")
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Field messages ordered by field name so responses are stable.
fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use validator::ValidationError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TechMarketError::validation("bad"), StatusCode::BAD_REQUEST),
            (TechMarketError::StateConflict("Helpful votes cannot go below 0".into()), StatusCode::BAD_REQUEST),
            (TechMarketError::not_found("Review not found"), StatusCode::NOT_FOUND),
            (TechMarketError::Conflict("Email already in use".into()), StatusCode::CONFLICT),
            (StorageError::Corrupt("cart".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_validation_message_uses_field_messages() {
        let mut errors = ValidationErrors::new();
        let mut quantity = ValidationError::new("range");
        quantity.message = Some("Quantity must be at least 1".into());
        errors.add("quantity", quantity);
        errors.add("title", ValidationError::new("length"));
        assert_eq!(validation_message(&errors), "Quantity must be at least 1, title is invalid");
    }
}
