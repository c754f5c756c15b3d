//! Database operations for the storefront `PostgreSQL` schema.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `category` / `sub_category` / `product` - Catalog tree
//! - `cart_line` - Per-client cart quantities, keyed by `(client_id, product_id)`
//! - `wishlist_entry` - Per-client liked products
//! - `customer_order` / `order_item` - Placed orders with frozen unit prices
//!
//! Cart and wishlist rows carry no foreign key to `product`. Reads join with
//! a `LEFT JOIN` and drop lines whose product has been deleted.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p ziva-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod wishlist;

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use ziva_core::{ProductId, SubCategoryId};

use crate::models::ProductSummary;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate name, product still ordered).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A computed value overflowed its column (SQLSTATE 22003).
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// A conditional stock decrement matched no row.
    #[error("insufficient stock for product {product_id} (available: {available})")]
    InsufficientStock {
        /// Product that ran short.
        product_id: ProductId,
        /// Units left at the time of the check.
        available: i32,
    },
}

impl RepositoryError {
    /// Map constraint violations from an insert or update.
    ///
    /// Unique and check violations become `Conflict`; a foreign-key violation
    /// means the referenced parent row is missing and becomes `NotFound`.
    /// Numeric overflow becomes `OutOfRange`.
    pub(crate) fn from_constraint(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return Self::NotFound;
            }
            if db_err.is_check_violation() {
                return Self::Conflict(db_err.message().to_string());
            }
            if is_out_of_range(db_err.code().as_deref()) {
                return Self::OutOfRange(db_err.message().to_string());
            }
        }
        Self::Database(err)
    }
}

/// `numeric_value_out_of_range`, raised for integer and numeric overflow.
fn is_out_of_range(code: Option<&str>) -> bool {
    code == Some("22003")
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Shared row fragments
// =============================================================================

/// Product columns as produced by a `LEFT JOIN shop.product p`, prefixed
/// `p_`. Every field is optional because the product may have been deleted.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JoinedProductRow {
    pub p_id: Option<i32>,
    pub p_sub_category_id: Option<i32>,
    pub p_name: Option<String>,
    pub p_description: Option<String>,
    pub p_price: Option<Decimal>,
    pub p_image_url: Option<String>,
    pub p_stock: Option<i32>,
}

impl JoinedProductRow {
    /// `None` when the joined product no longer exists.
    pub(crate) fn into_summary(self) -> Option<ProductSummary> {
        Some(ProductSummary {
            id: ProductId::new(self.p_id?),
            sub_category_id: SubCategoryId::new(self.p_sub_category_id?),
            name: self.p_name?,
            description: self.p_description,
            price: self.p_price?,
            image_url: self.p_image_url,
            stock: self.p_stock?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphaned_join_has_no_summary() {
        let row = JoinedProductRow {
            p_id: None,
            p_sub_category_id: None,
            p_name: None,
            p_description: None,
            p_price: None,
            p_image_url: None,
            p_stock: None,
        };
        assert!(row.into_summary().is_none());
    }

    #[test]
    fn test_joined_row_into_summary() {
        let row = JoinedProductRow {
            p_id: Some(4),
            p_sub_category_id: Some(2),
            p_name: Some("Wheelbarrow".to_string()),
            p_description: None,
            p_price: Some(Decimal::new(8900, 2)),
            p_image_url: None,
            p_stock: Some(3),
        };
        let summary = row.into_summary();
        assert_eq!(summary.as_ref().map(|s| s.id), Some(ProductId::new(4)));
        assert_eq!(summary.map(|s| s.stock), Some(3));
    }

    #[test]
    fn test_out_of_range_code() {
        assert!(is_out_of_range(Some("22003")));
        assert!(!is_out_of_range(Some("23505")));
        assert!(!is_out_of_range(None));
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = RepositoryError::InsufficientStock {
            product_id: ProductId::new(9),
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for product 9 (available: 2)"
        );
    }
}
