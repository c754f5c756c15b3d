//! Order engine error types.

use thiserror::Error;

use ziva_core::{CheckoutError, OrderId, ProductId, StatusError};

use crate::db::RepositoryError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The checkout payload failed validation.
    #[error(transparent)]
    Invalid(#[from] CheckoutError),

    /// An ordered product doesn't exist.
    #[error("Product not found: ID {0}")]
    ProductNotFound(ProductId),

    /// An ordered quantity exceeds stock.
    #[error("Insufficient stock for product ID {product_id}. Available: {available}")]
    InsufficientStock {
        /// Product that ran short.
        product_id: ProductId,
        /// Units currently in stock.
        available: i32,
    },

    /// The order doesn't exist or belongs to another client.
    #[error("Order not found or unauthorized")]
    OrderNotFound(OrderId),

    /// The requested status change breaks the order lifecycle.
    #[error(transparent)]
    InvalidTransition(#[from] StatusError),

    /// The status changed between read and write.
    #[error("order {0} was modified concurrently, please retry")]
    ConcurrentUpdate(OrderId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InsufficientStock {
                product_id,
                available,
            } => Self::InsufficientStock {
                product_id,
                available,
            },
            other => Self::Repository(other),
        }
    }
}
