use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use consilium::AiError;
use serde_json::{Value, json};
use tracing::error;

use crate::{storage::StorageError, validation::FieldError};

/// JSON error response: `{"error": ..., "details": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl ApiError {
    pub fn bad_request(message: &str, details: Value) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": message, "details": details }),
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "error": message }),
        }
    }

    pub fn not_found(resource: &str, id: i64) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({ "error": format!("{} not found", resource), "id": id }),
        }
    }

    pub fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": message }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::bad_request(
            "Invalid input data",
            json!({ err.field: [err.message] }),
        )
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        let (status, message) = match err {
            AiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, err.to_string()),
            AiError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                "Invalid input data. Please check your request.".to_string(),
            ),
            AiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        };
        Self {
            status,
            body: json!({ "error": message }),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        error!(error = %err, "Storage operation failed");
        ApiError::internal("An internal error occurred. Please try again later.")
    }
}
