//! Error types for shipyard-server
//!
//! Every request-path failure ends up as a [`ServerError`], whose
//! [`IntoResponse`] impl fixes the status code and JSON body the client sees.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Body of every 401
pub const UNAUTHENTICATED_DETAIL: &str = "Could not validate credentials";

/// Body of every 429
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Main error type for shipyard-server
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ServerError {
    /// Record store rejected the operation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request body is not a valid ship
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Missing or rejected bearer credentials
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// Client exceeded its request budget
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Seconds until the client's window resets
        retry_after_secs: u64,
    },
}

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Self::Unauthenticated => {
                let mut resp = (status, Json(json!({ "detail": UNAUTHENTICATED_DETAIL }))).into_response();
                resp.headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                resp
            }
            Self::RateLimited { retry_after_secs } => {
                let mut resp = (status, Json(json!({ "error": RATE_LIMITED_MESSAGE }))).into_response();
                resp.headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                resp
            }
            Self::Store(err) => (status, Json(json!({ "detail": err.to_string() }))).into_response(),
            Self::InvalidBody(detail) => (status, Json(json!({ "detail": detail }))).into_response(),
        }
    }
}
