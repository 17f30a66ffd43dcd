//! Rejections produced by the request gate.
//!
//! A rejected request is answered with a bare `400 Bad Request`; the reason is
//! only written to the log so nothing about the shared secret leaks to callers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Request body is not a valid issue: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("Token does not match")]
    TokenMismatch,

    #[error("Channel parameter is missing or empty")]
    MissingChannel,

    #[error("Issue title is empty")]
    EmptyTitle,
}

impl ValidationError {
    /// Machine-readable reason used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationError::MalformedBody(_) => "malformed_body",
            ValidationError::TokenMismatch => "token_mismatch",
            ValidationError::MissingChannel => "missing_channel",
            ValidationError::EmptyTitle => "empty_title",
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        StatusCode::BAD_REQUEST.into_response()
    }
}
