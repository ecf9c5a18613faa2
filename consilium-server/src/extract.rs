//! Request extractors with JSON error bodies.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::ApiError;

/// Header carrying the caller identity set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

const USER_ID_MAX_CHARS: usize = 255;

/// `Json<T>` whose rejection is a 400 with the parser's message as details.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ApiError::bad_request(
                "Invalid input data",
                json!({ "body": [rejection.body_text()] }),
            )),
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.chars().count() <= USER_ID_MAX_CHARS)
            .map(|value| CallerId(value.to_string()))
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}
