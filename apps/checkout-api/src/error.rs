//! # API Errors
//!
//! ## Error Taxonomy
//! ```text
//! ┌───────────────────────┬────────┬──────────────────────────────────────┐
//! │ Variant               │ Status │ Body { error }                       │
//! ├───────────────────────┼────────┼──────────────────────────────────────┤
//! │ Validation            │ 400    │ message verbatim                     │
//! │ Stock                 │ 400    │ message verbatim                     │
//! │ TooManyPendingOrders  │ 400    │ fixed message                        │
//! │ BadRequest            │ 400    │ message verbatim                     │
//! │ RateLimited           │ 429    │ retry-later message per scope        │
//! │ StorefrontNotFound    │ 404    │ "Storefront not found"               │
//! │ OrderNotFound         │ 404    │ "Order not found"                    │
//! │ Config / Database /   │ 500    │ generic; detail only in the logs     │
//! │ Internal              │        │                                      │
//! └───────────────────────┴────────┴──────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

use storefront_core::{CoreError, ValidationError};
use storefront_db::DbError;

/// Which rate-limit window was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    Ip,
    Phone,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Checkout steps 1-6.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Product missing or short on stock at order time.
    #[error(transparent)]
    Stock(CoreError),

    #[error("You have too many pending orders. Please wait for them to be processed.")]
    TooManyPendingOrders,

    /// Malformed request body.
    #[error("{0}")]
    BadRequest(String),

    #[error("Rate limited ({0:?})")]
    RateLimited(RateLimitScope),

    #[error("Storefront not found: {0}")]
    StorefrontNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Deployment problem, e.g. the storefront's brand row is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(inner) => ApiError::Validation(inner),
            other => ApiError::Stock(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Stock(_)
            | ApiError::TooManyPendingOrders
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::StorefrontNotFound(_) | ApiError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Config(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the shopper.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::RateLimited(RateLimitScope::Ip) => {
                "Too many requests. Please try again later.".to_string()
            }
            ApiError::RateLimited(RateLimitScope::Phone) => {
                "Too many orders for this phone number. Please try again later.".to_string()
            }
            ApiError::StorefrontNotFound(_) => "Storefront not found".to_string(),
            ApiError::OrderNotFound(_) => "Order not found".to_string(),
            ApiError::Config(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                "Something went wrong while placing your order. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Config(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                error!(error = %self, "Request failed");
            }
            ApiError::RateLimited(_) => warn!(error = %self, "Rate limit hit"),
            _ => debug!(error = %self, "Request rejected"),
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;
