//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`
//! and every error body is JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use ziva_core::ClientIdError;

use crate::db::RepositoryError;
use crate::services::{CartError, OrderError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authorized for this endpoint.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// The request conflicts with current state (stock, lifecycle, references).
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Not found".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::OutOfRange(msg) => Self::BadRequest(msg),
            RepositoryError::InsufficientStock {
                product_id,
                available,
            } => Self::Conflict(format!(
                "Insufficient stock for product ID {product_id}. Available: {available}"
            )),
            other => Self::Database(other),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity | CartError::QuantityTooLarge(_) => {
                Self::BadRequest(err.to_string())
            }
            CartError::ProductNotFound(_) | CartError::LineNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            CartError::InsufficientStock { .. } => Self::Conflict(err.to_string()),
            CartError::Repository(e) => e.into(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Invalid(_) => Self::BadRequest(err.to_string()),
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            OrderError::InsufficientStock { .. }
            | OrderError::InvalidTransition(_)
            | OrderError::ConcurrentUpdate(_) => Self::Conflict(err.to_string()),
            OrderError::Repository(e) => e.into(),
        }
    }
}

impl From<ClientIdError> for AppError {
    fn from(err: ClientIdError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a storefront action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", &[("product_id", "12")]);
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };
    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }
    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use ziva_core::{CheckoutError, OrderId, OrderStatus, ProductId, StatusError};

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let response =
            AppError::Database(RepositoryError::DataCorruption("bad row".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_conflict() {
        let err = AppError::from(OrderError::InsufficientStock {
            product_id: ProductId::new(3),
            available: 1,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "Insufficient stock for product ID 3. Available: 1"
        );
    }

    #[test]
    fn test_order_error_statuses() {
        assert_eq!(
            AppError::from(OrderError::Invalid(CheckoutError::EmptyItems)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(OrderError::OrderNotFound(OrderId::new(1))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(OrderError::InvalidTransition(StatusError {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            }))
            .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_cart_error_statuses() {
        assert_eq!(
            AppError::from(CartError::InvalidQuantity).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CartError::LineNotFound(ProductId::new(2))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(CartError::Repository(RepositoryError::Conflict("x".into()))).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(CartError::QuantityTooLarge(ProductId::new(2))).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
