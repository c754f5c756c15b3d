//! Database operations for cart lines.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use ziva_core::{CartLineId, ClientId, ProductId};

use super::{JoinedProductRow, RepositoryError};
use crate::models::CartLine;

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    client_id: ClientId,
    product_id: i32,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: JoinedProductRow,
}

impl CartLineRow {
    /// Convert into a [`CartLine`], or `None` if the product is gone.
    fn into_line(self) -> Option<CartLine> {
        let product = self.product.into_summary()?;
        Some(CartLine {
            id: CartLineId::new(self.id),
            client_id: self.client_id,
            product_id: ProductId::new(self.product_id),
            quantity: self.quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
            product,
        })
    }
}

/// Keep lines with a live product, logging the rest.
fn drop_orphans(rows: Vec<CartLineRow>) -> Vec<CartLine> {
    rows.into_iter()
        .filter_map(|row| {
            let (line_id, product_id) = (row.id, row.product_id);
            let line = row.into_line();
            if line.is_none() {
                tracing::warn!(line_id, product_id, "Skipping cart line for deleted product");
            }
            line
        })
        .collect()
}

/// Repository for cart line database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a client's cart lines, ordered by line id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn list(&self, client_id: &ClientId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT l.id, l.client_id, l.product_id, l.quantity, l.created_at, l.updated_at,
                   p.id AS p_id, p.sub_category_id AS p_sub_category_id, p.name AS p_name,
                   p.description AS p_description, p.price AS p_price,
                   p.image_url AS p_image_url, p.stock AS p_stock
            FROM shop.cart_line l
            LEFT JOIN shop.product p ON p.id = l.product_id
            WHERE l.client_id = $1
            ORDER BY l.id
            ",
        )
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;

        Ok(drop_orphans(rows))
    }

    /// Add `quantity` to a line, creating it if absent.
    ///
    /// Runs as a single upsert so concurrent adds for the same product sum
    /// correctly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product vanished between the
    /// caller's check and the write.
    /// Returns `RepositoryError::OutOfRange` if the merged quantity overflows.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn add(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            WITH line AS (
                INSERT INTO shop.cart_line (client_id, product_id, quantity)
                VALUES ($1, $2, $3)
                ON CONFLICT (client_id, product_id)
                DO UPDATE SET quantity = shop.cart_line.quantity + EXCLUDED.quantity,
                              updated_at = NOW()
                RETURNING id, client_id, product_id, quantity, created_at, updated_at
            )
            SELECT l.id, l.client_id, l.product_id, l.quantity, l.created_at, l.updated_at,
                   p.id AS p_id, p.sub_category_id AS p_sub_category_id, p.name AS p_name,
                   p.description AS p_description, p.price AS p_price,
                   p.image_url AS p_image_url, p.stock AS p_stock
            FROM line l
            LEFT JOIN shop.product p ON p.id = l.product_id
            ",
        )
        .bind(client_id)
        .bind(product_id.as_i32())
        .bind(quantity)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "cart line already exists"))?;

        row.into_line().ok_or(RepositoryError::NotFound)
    }

    /// Overwrite a line's quantity.
    ///
    /// Returns `None` if the client has no line for the product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn set_quantity(
        &self,
        client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            WITH line AS (
                UPDATE shop.cart_line
                SET quantity = $3, updated_at = NOW()
                WHERE client_id = $1 AND product_id = $2
                RETURNING id, client_id, product_id, quantity, created_at, updated_at
            )
            SELECT l.id, l.client_id, l.product_id, l.quantity, l.created_at, l.updated_at,
                   p.id AS p_id, p.sub_category_id AS p_sub_category_id, p.name AS p_name,
                   p.description AS p_description, p.price AS p_price,
                   p.image_url AS p_image_url, p.stock AS p_stock
            FROM line l
            LEFT JOIN shop.product p ON p.id = l.product_id
            ",
        )
        .bind(client_id)
        .bind(product_id.as_i32())
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.and_then(CartLineRow::into_line))
    }

    /// Delete the line for a product. Returns the number of rows removed.
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
            sqlx::query("DELETE FROM shop.cart_line WHERE client_id = $1 AND product_id = $2")
                .bind(client_id)
                .bind(product_id.as_i32())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Delete all of a client's lines. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn clear(&self, client_id: &ClientId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_line WHERE client_id = $1")
            .bind(client_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
