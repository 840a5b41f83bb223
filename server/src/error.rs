//! Route-level error type and its HTTP mapping.
//!
//! Two error kinds reach the caller: validation failures (bad or missing
//! request fields, bad webhook signatures) map to 400, upstream provider
//! failures map to 500 with the provider's message passed through.
//! Handler failures inside webhook dispatch never reach this type; they
//! are recovered and logged by the dispatcher.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::webhook::SignatureError;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The webhook envelope failed signature verification.
    #[error("{0}")]
    Authentication(#[from] SignatureError),

    /// An outbound provider call failed.
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Shorthand for a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn upstream(provider: &'static str, message: impl Into<String>) -> Self {
        ApiError::Upstream {
            provider,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message })),
            )
                .into_response(),
            // The webhook origin expects a plain-text 400 body.
            ApiError::Authentication(err) => (
                StatusCode::BAD_REQUEST,
                format!("Webhook Error: {}", err),
            )
                .into_response(),
            ApiError::Upstream { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}
