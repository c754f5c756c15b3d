//! Cart and wishlist error types.

use thiserror::Error;

use ziva_core::ProductId;

use crate::db::RepositoryError;

/// Errors that can occur during cart and wishlist operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity below 1.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Referenced product doesn't exist.
    #[error("Product not found: ID {0}")]
    ProductNotFound(ProductId),

    /// The client has no line for this product.
    #[error("Cart item with productId {0} not found")]
    LineNotFound(ProductId),

    /// Requested quantity exceeds current stock.
    #[error("Insufficient stock for product ID {product_id}. Available: {available}")]
    InsufficientStock {
        /// Product that ran short.
        product_id: ProductId,
        /// Units currently in stock.
        available: i32,
    },

    /// Merging the add into the existing line overflows the quantity.
    #[error("Cart quantity for product ID {0} is too large")]
    QuantityTooLarge(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
