//! Order engine.
//!
//! Turns a checkout payload into a persisted order. Validation happens in
//! three stages, and nothing is written unless all pass:
//!
//! 1. Payload shape and field formats ([`CheckoutRequest::validate`]).
//! 2. Every product exists and has enough stock for the order's total
//!    quantity of it (read outside the transaction, for a precise message).
//! 3. The conditional stock decrement inside the commit transaction, which
//!    catches checkouts racing for the same units.

mod error;

pub use error::OrderError;

use std::collections::{BTreeMap, HashMap};

use sqlx::PgPool;
use tracing::instrument;

use ziva_core::{CheckoutRequest, ClientId, OrderId, OrderStatus, ProductId};

use crate::db::OrderRepository;
use crate::models::Order;

/// Order engine.
pub struct OrderEngine<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderEngine<'a> {
    /// Create a new order engine.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Validate a checkout and persist it as a `PENDING` order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Invalid` if the payload fails validation.
    /// Returns `OrderError::ProductNotFound` if a product doesn't exist.
    /// Returns `OrderError::InsufficientStock` if stock can't cover the order,
    /// whether detected up front or at commit.
    #[instrument(skip(self, request), fields(client_id = tracing::field::Empty))]
    pub async fn create_order(&self, request: CheckoutRequest) -> Result<OrderId, OrderError> {
        let checkout = request.validate()?;
        tracing::Span::current().record("client_id", checkout.client_id.as_str());

        let quantities = checkout.quantities_by_product();
        let product_ids: Vec<ProductId> = quantities.keys().copied().collect();
        let stock = self.orders.stock_levels(&product_ids).await?;
        check_stock(&quantities, &stock)?;

        let items_total = checkout.items_total();
        if items_total != checkout.subtotal {
            tracing::warn!(
                client_id = %checkout.client_id,
                subtotal = %checkout.subtotal,
                items_total = %items_total,
                "Checkout subtotal differs from item total"
            );
        }

        let order_id = self.orders.create(&checkout).await?;
        tracing::info!(order_id = %order_id, client_id = %checkout.client_id, "Checkout complete");
        Ok(order_id)
    }

    /// Fetch one of the client's orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if absent or owned by another client.
    pub async fn get_order(
        &self,
        client_id: &ClientId,
        order_id: OrderId,
    ) -> Result<Order, OrderError> {
        self.orders
            .get(client_id, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// List the client's orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_orders(&self, client_id: &ClientId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_client(client_id).await?)
    }

    /// Move one of the client's orders to `status` and return the result.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if absent or not owned.
    /// Returns `OrderError::InvalidTransition` if the lifecycle forbids it.
    /// Returns `OrderError::ConcurrentUpdate` if the status changed meanwhile.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn update_status(
        &self,
        client_id: &ClientId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderError> {
        self.change_status(order_id, Some(client_id), status).await?;
        self.get_order(client_id, order_id).await
    }

    /// Delete one of the client's orders and its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if absent or not owned.
    #[instrument(skip(self, client_id), fields(client_id = %client_id))]
    pub async fn delete_order(
        &self,
        client_id: &ClientId,
        order_id: OrderId,
    ) -> Result<(), OrderError> {
        if !self.orders.delete(client_id, order_id).await? {
            return Err(OrderError::OrderNotFound(order_id));
        }
        tracing::info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// List the most recent orders across all clients.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_all(&self, limit: i64) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_all(limit).await?)
    }

    /// Move any order to `status`, following the same lifecycle rules.
    ///
    /// # Errors
    ///
    /// Same as [`OrderEngine::update_status`], without the ownership check.
    #[instrument(skip(self))]
    pub async fn admin_update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderStatus, OrderError> {
        self.change_status(order_id, None, status).await
    }

    async fn change_status(
        &self,
        order_id: OrderId,
        owner: Option<&ClientId>,
        status: OrderStatus,
    ) -> Result<OrderStatus, OrderError> {
        let current = self
            .orders
            .find_status(order_id, owner)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let next = current.transition_to(status)?;
        if next == current {
            return Ok(current);
        }

        if !self
            .orders
            .update_status(order_id, owner, current, next)
            .await?
        {
            return Err(OrderError::ConcurrentUpdate(order_id));
        }

        tracing::info!(order_id = %order_id, from = %current, to = %next, "Order status changed");
        Ok(next)
    }
}

/// Check requested totals per product against current stock.
///
/// Products are checked in ascending id order; the first failure wins.
fn check_stock(
    quantities: &BTreeMap<ProductId, i32>,
    stock: &HashMap<ProductId, i32>,
) -> Result<(), OrderError> {
    for (&product_id, &quantity) in quantities {
        let available = *stock
            .get(&product_id)
            .ok_or(OrderError::ProductNotFound(product_id))?;
        if quantity > available {
            return Err(OrderError::InsufficientStock {
                product_id,
                available,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    fn id(n: i32) -> ProductId {
        ProductId::new(n)
    }

    #[test]
    fn test_check_stock_passes_when_covered() {
        let quantities = BTreeMap::from([(id(1), 2), (id(2), 5)]);
        let stock = HashMap::from([(id(1), 2), (id(2), 9)]);
        assert!(check_stock(&quantities, &stock).is_ok());
    }

    #[test]
    fn test_check_stock_missing_product() {
        let quantities = BTreeMap::from([(id(1), 1), (id(3), 1)]);
        let stock = HashMap::from([(id(1), 5)]);
        let err = check_stock(&quantities, &stock).unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound(p) if p == id(3)));
        assert_eq!(err.to_string(), "Product not found: ID 3");
    }

    #[test]
    fn test_check_stock_uses_merged_quantity() {
        // Two lines of 3 for a product with 5 in stock arrive merged as 6.
        let quantities = BTreeMap::from([(id(4), 6)]);
        let stock = HashMap::from([(id(4), 5)]);
        let err = check_stock(&quantities, &stock).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock { available: 5, .. }
        ));
    }

    #[test]
    fn test_repository_shortfall_maps_to_insufficient_stock() {
        let err = OrderError::from(RepositoryError::InsufficientStock {
            product_id: id(2),
            available: 0,
        });
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product ID 2. Available: 0"
        );
        assert!(matches!(
            OrderError::from(RepositoryError::NotFound),
            OrderError::Repository(RepositoryError::NotFound)
        ));
    }
}
