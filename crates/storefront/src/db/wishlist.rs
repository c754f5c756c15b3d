//! Database operations for wishlist entries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use ziva_core::{ClientId, ProductId, WishlistEntryId};

use super::{JoinedProductRow, RepositoryError};
use crate::models::WishlistEntry;

#[derive(Debug, sqlx::FromRow)]
struct WishlistEntryRow {
    id: i32,
    client_id: ClientId,
    product_id: i32,
    created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: JoinedProductRow,
}

impl WishlistEntryRow {
    fn into_entry(self) -> Option<WishlistEntry> {
        let product = self.product.into_summary()?;
        Some(WishlistEntry {
            id: WishlistEntryId::new(self.id),
            client_id: self.client_id,
            product_id: ProductId::new(self.product_id),
            created_at: self.created_at,
            product,
        })
    }
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a client's wishlist, ordered by entry id.
    ///
    /// Entries whose product has been deleted are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn list(&self, client_id: &ClientId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistEntryRow>(
            r"
            SELECT w.id, w.client_id, w.product_id, w.created_at,
                   p.id AS p_id, p.sub_category_id AS p_sub_category_id, p.name AS p_name,
                   p.description AS p_description, p.price AS p_price,
                   p.image_url AS p_image_url, p.stock AS p_stock
            FROM shop.wishlist_entry w
            LEFT JOIN shop.product p ON p.id = w.product_id
            WHERE w.client_id = $1
            ORDER BY w.id
            ",
        )
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let (entry_id, product_id) = (row.id, row.product_id);
                let entry = row.into_entry();
                if entry.is_none() {
                    tracing::warn!(
                        entry_id,
                        product_id,
                        "Skipping wishlist entry for deleted product"
                    );
                }
                entry
            })
            .collect())
    }

    /// Add a product, returning the existing entry if already present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product vanished between the
    /// caller's check and the write.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn add(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> Result<WishlistEntry, RepositoryError> {
        // The data-modifying CTE and the fallback SELECT see the same
        // snapshot, so exactly one branch yields the row.
        let row = sqlx::query_as::<_, WishlistEntryRow>(
            r"
            WITH inserted AS (
                INSERT INTO shop.wishlist_entry (client_id, product_id)
                VALUES ($1, $2)
                ON CONFLICT (client_id, product_id) DO NOTHING
                RETURNING id, client_id, product_id, created_at
            ), entry AS (
                SELECT id, client_id, product_id, created_at FROM inserted
                UNION ALL
                SELECT id, client_id, product_id, created_at
                FROM shop.wishlist_entry
                WHERE client_id = $1 AND product_id = $2
            )
            SELECT w.id, w.client_id, w.product_id, w.created_at,
                   p.id AS p_id, p.sub_category_id AS p_sub_category_id, p.name AS p_name,
                   p.description AS p_description, p.price AS p_price,
                   p.image_url AS p_image_url, p.stock AS p_stock
            FROM entry w
            LEFT JOIN shop.product p ON p.id = w.product_id
            LIMIT 1
            ",
        )
        .bind(client_id)
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.and_then(WishlistEntryRow::into_entry)
            .ok_or(RepositoryError::NotFound)
    }

    /// Remove a product. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn remove(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.wishlist_entry WHERE client_id = $1 AND product_id = $2")
                .bind(client_id)
                .bind(product_id.as_i32())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
