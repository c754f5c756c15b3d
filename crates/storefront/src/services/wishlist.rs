//! Wishlist service.

use sqlx::PgPool;
use tracing::instrument;

use ziva_core::{ClientId, ProductId};

use super::cart::CartError;
use crate::db::{CatalogRepository, RepositoryError, WishlistRepository};
use crate::models::WishlistEntry;

/// Wishlist service. Shares [`CartError`] with the cart.
pub struct WishlistService<'a> {
    wishlist: WishlistRepository<'a>,
    catalog: CatalogRepository<'a>,
}

impl<'a> WishlistService<'a> {
    /// Create a new wishlist service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            wishlist: WishlistRepository::new(pool),
            catalog: CatalogRepository::new(pool),
        }
    }

    /// Get a client's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn get(&self, client_id: &ClientId) -> Result<Vec<WishlistEntry>, CartError> {
        Ok(self.wishlist.list(client_id).await?)
    }

    /// Like a product. Adding an already-liked product returns the existing
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product doesn't exist.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn add(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> Result<WishlistEntry, CartError> {
        if self.catalog.find_summary(product_id).await?.is_none() {
            return Err(CartError::ProductNotFound(product_id));
        }

        self.wishlist
            .add(client_id, product_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound(product_id),
                other => CartError::Repository(other),
            })
    }

    /// Unlike a product. Removing a missing entry succeeds.
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
        let removed = self.wishlist.remove(client_id, product_id).await?;
        if removed == 0 {
            tracing::warn!("No wishlist entry to remove");
        }
        Ok(removed)
    }
}
