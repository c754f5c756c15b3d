//! Database operations for orders.
//!
//! Order creation runs in one transaction: insert the order, insert its
//! items, then decrement stock with a conditional update per product. Any
//! shortfall rolls the whole transaction back.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use ziva_core::{Checkout, ClientId, Email, OrderId, OrderItemId, OrderStatus, ProductId};

use super::{JoinedProductRow, RepositoryError};
use crate::models::{Order, OrderItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    client_id: ClientId,
    email: Email,
    fullname: String,
    phone: String,
    company: Option<String>,
    country: String,
    state: String,
    address: String,
    apartment: Option<String>,
    city: String,
    postal_code: String,
    subtotal: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(self.id),
            client_id: self.client_id,
            email: self.email,
            fullname: self.fullname,
            phone: self.phone,
            company: self.company,
            country: self.country,
            state: self.state,
            address: self.address,
            apartment: self.apartment,
            city: self.city,
            postal_code: self.postal_code,
            subtotal: self.subtotal,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            order_items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
    #[sqlx(flatten)]
    product: JoinedProductRow,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let product = row.product.into_summary().ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "order item {} references missing product {}",
                row.id, row.product_id
            ))
        })?;
        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            price: row.price,
            product,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: i32,
    stock: i32,
}

/// Select list shared by every order query.
const ORDER_COLUMNS: &str = "id, client_id, email, fullname, phone, company, country, state, \
                             address, apartment, city, postal_code, subtotal, status, \
                             created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current stock for each of `product_ids` that exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stock_levels(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, i32>, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, StockRow>(
            "SELECT id, stock FROM shop.product WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (ProductId::new(row.id), row.stock))
            .collect())
    }

    /// Persist a validated checkout and decrement stock atomically.
    ///
    /// Stock is decremented per product in ascending id order so concurrent
    /// checkouts lock rows in the same order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientStock` if any product is short
    /// at commit time, or `RepositoryError::NotFound` if a product was
    /// deleted. Nothing is written in either case.
    #[instrument(skip(self, checkout), fields(client_id = %checkout.client_id, items = checkout.items.len()))]
    pub async fn create(&self, checkout: &Checkout) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO shop.customer_order
                (client_id, email, fullname, phone, company, country, state, address,
                 apartment, city, postal_code, subtotal, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'PENDING')
            RETURNING id
            ",
        )
        .bind(&checkout.client_id)
        .bind(&checkout.email)
        .bind(&checkout.shipping.fullname)
        .bind(&checkout.shipping.phone)
        .bind(checkout.shipping.company.as_deref())
        .bind(&checkout.shipping.country)
        .bind(&checkout.shipping.state)
        .bind(&checkout.shipping.address)
        .bind(checkout.shipping.apartment.as_deref())
        .bind(&checkout.shipping.city)
        .bind(&checkout.shipping.postal_code)
        .bind(checkout.subtotal)
        .fetch_one(&mut *tx)
        .await?;

        for item in &checkout.items {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(item.product_id.as_i32())
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "duplicate order item"))?;
        }

        decrement_stock(&mut tx, &checkout.quantities_by_product()).await?;

        tx.commit().await?;

        tracing::info!(order_id, "Order created");
        Ok(OrderId::new(order_id))
    }

    /// Fetch an order owned by `client_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn get(
        &self,
        client_id: &ClientId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1 AND client_id = $2"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id.as_i32())
            .bind(client_id)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut orders = self.attach_items(vec![row]).await?;
        Ok(orders.pop())
    }

    /// List a client's orders, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn list_for_client(&self, client_id: &ClientId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE client_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(client_id)
            .fetch_all(self.pool)
            .await?;

        self.attach_items(rows).await
    }

    /// List the most recent orders across all clients, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order ORDER BY id DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        self.attach_items(rows).await
    }

    /// Read an order's status, optionally scoped to an owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_status(
        &self,
        order_id: OrderId,
        owner: Option<&ClientId>,
    ) -> Result<Option<OrderStatus>, RepositoryError> {
        let status: Option<(OrderStatus,)> = sqlx::query_as(
            r"
            SELECT status FROM shop.customer_order
            WHERE id = $1 AND ($2::text IS NULL OR client_id = $2)
            ",
        )
        .bind(order_id.as_i32())
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(status.map(|(s,)| s))
    }

    /// Change an order's status if it still has status `expected`.
    ///
    /// Returns `false` when the row no longer matches (missing, not owned, or
    /// changed concurrently).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, owner))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        owner: Option<&ClientId>,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.customer_order
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2 AND ($4::text IS NULL OR client_id = $4)
            ",
        )
        .bind(order_id.as_i32())
        .bind(expected)
        .bind(status)
        .bind(owner)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete an order and its items. Returns `false` if the client owns no
    /// such order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn delete(
        &self,
        client_id: &ClientId,
        order_id: OrderId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<(i32,)> = sqlx::query_as(
            "SELECT id FROM shop.customer_order WHERE id = $1 AND client_id = $2 FOR UPDATE",
        )
        .bind(order_id.as_i32())
        .bind(client_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM shop.order_item WHERE order_id = $1")
            .bind(order_id.as_i32())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shop.customer_order WHERE id = $1")
            .bind(order_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Load items for `rows` and assemble full orders, preserving row order.
    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.id, i.order_id, i.product_id, i.quantity, i.price,
                   p.id AS p_id, p.sub_category_id AS p_sub_category_id, p.name AS p_name,
                   p.description AS p_description, p.price AS p_price,
                   p.image_url AS p_image_url, p.stock AS p_stock
            FROM shop.order_item i
            LEFT JOIN shop.product p ON p.id = i.product_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: BTreeMap<i32, Vec<OrderItem>> = BTreeMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(row)?);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }
}

/// Conditionally decrement stock for every product inside `tx`.
async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    quantities: &BTreeMap<ProductId, i32>,
) -> Result<(), RepositoryError> {
    for (&product_id, &quantity) in quantities {
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<(i32,)> =
                sqlx::query_as("SELECT stock FROM shop.product WHERE id = $1")
                    .bind(product_id.as_i32())
                    .fetch_optional(&mut **tx)
                    .await?;

            return Err(match available {
                Some((available,)) => RepositoryError::InsufficientStock {
                    product_id,
                    available,
                },
                None => RepositoryError::NotFound,
            });
        }
    }
    Ok(())
}
