//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ziva_core::{ClientId, Email, OrderId, OrderItemId, OrderStatus, ProductId};

use super::catalog::ProductSummary;

/// A placed order with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    pub email: Email,
    pub fullname: String,
    pub phone: String,
    pub company: Option<String>,
    pub country: String,
    pub state: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub postal_code: String,
    /// Subtotal as submitted at checkout.
    pub subtotal: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order_items: Vec<OrderItem>,
}

/// A line of an order. `price` is the unit price frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
    pub product: ProductSummary,
}

impl Order {
    /// Sum of frozen unit price times quantity over all items.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        self.order_items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }
}

/// Response body for a created order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: OrderId,
}
