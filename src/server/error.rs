//! Error responses for the HTTP API.
//!
//! Every failure is rendered as `{"message": ..., "request_id": ...}` with a
//! status derived from the error kind.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use super::auth::AuthError;
use crate::types::RequestId;

/// Errors surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed body, missing or invalid seed, missing page ID.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or wrong automations token.
    #[error(transparent)]
    Authentication(#[from] AuthError),

    /// Webhook signature did not match.
    #[error("Invalid Notion webhook signature")]
    InvalidSignature,

    /// The job dispatcher is at capacity.
    #[error("Server is busy, try again later")]
    CapacityExceeded,
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) | ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ApiError::CapacityExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Attaches the request ID that the response body will carry.
    pub fn for_request(self, request_id: &RequestId) -> ErrorResponse {
        ErrorResponse {
            error: self,
            request_id: request_id.clone(),
        }
    }
}

/// An [`ApiError`] bound to a request.
#[derive(Debug)]
pub struct ErrorResponse {
    pub error: ApiError,
    pub request_id: RequestId,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    request_id: &'a str,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.error.to_string(),
            request_id: self.request_id.as_str(),
        };
        (self.error.status(), Json(body)).into_response()
    }
}
