//! Cart service.
//!
//! Validates cart mutations against the catalog before persisting them.
//! Only the quantity of a single add is checked against stock; the running
//! line total is reconciled at checkout.

mod error;

pub use error::CartError;

use sqlx::PgPool;
use tracing::instrument;

use ziva_core::{ClientId, ProductId};

use crate::db::{CartRepository, CatalogRepository, RepositoryError};
use crate::models::{CartLine, ProductSummary};

/// Cart service.
pub struct CartService<'a> {
    cart: CartRepository<'a>,
    catalog: CatalogRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            cart: CartRepository::new(pool),
            catalog: CatalogRepository::new(pool),
        }
    }

    /// Get a client's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn get(&self, client_id: &ClientId) -> Result<Vec<CartLine>, CartError> {
        Ok(self.cart.list(client_id).await?)
    }

    /// Add `quantity` units of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`.
    /// Returns `CartError::ProductNotFound` if the product doesn't exist.
    /// Returns `CartError::InsufficientStock` if `quantity` alone exceeds stock.
    /// Returns `CartError::QuantityTooLarge` if the merged line overflows.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn add(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, CartError> {
        check_quantity(quantity)?;
        let product = self.product(product_id).await?;
        check_stock(&product, quantity)?;

        let line = self
            .cart
            .add(client_id, product_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound(product_id),
                RepositoryError::OutOfRange(_) => CartError::QuantityTooLarge(product_id),
                other => CartError::Repository(other),
            })?;

        tracing::info!(line_quantity = line.quantity, "Added to cart");
        Ok(line)
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`.
    /// Returns `CartError::ProductNotFound` if the product doesn't exist.
    /// Returns `CartError::InsufficientStock` if `quantity` exceeds stock.
    /// Returns `CartError::LineNotFound` if the client has no line for it.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn set_quantity(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, CartError> {
        check_quantity(quantity)?;
        let product = self.product(product_id).await?;
        check_stock(&product, quantity)?;

        self.cart
            .set_quantity(client_id, product_id, quantity)
            .await?
            .ok_or(CartError::LineNotFound(product_id))
    }

    /// Remove a product's line. Removing a missing line succeeds.
    ///
    /// Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn remove(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> Result<u64, CartError> {
        let removed = self.cart.remove(client_id, product_id).await?;
        if removed == 0 {
            tracing::warn!("No cart line to remove");
        }
        Ok(removed)
    }

    /// Remove every line. Clearing an empty cart succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn clear(&self, client_id: &ClientId) -> Result<u64, CartError> {
        let removed = self.cart.clear(client_id).await?;
        if removed == 0 {
            tracing::warn!("Cart already empty");
        }
        Ok(removed)
    }

    async fn product(&self, product_id: ProductId) -> Result<ProductSummary, CartError> {
        self.catalog
            .find_summary(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))
    }
}

/// Reject quantities below 1.
pub(crate) fn check_quantity(quantity: i32) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }
    Ok(())
}

/// Reject a quantity the product can't cover right now.
pub(crate) fn check_stock(product: &ProductSummary, quantity: i32) -> Result<(), CartError> {
    if quantity > product.stock {
        return Err(CartError::InsufficientStock {
            product_id: product.id,
            available: product.stock,
        });
    }
    Ok(())
}
