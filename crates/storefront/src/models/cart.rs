//! Cart line and wishlist entry models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ziva_core::{CartLineId, ClientId, ProductId, WishlistEntryId};

use super::catalog::ProductSummary;

/// One product in a client's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartLineId,
    pub client_id: ClientId,
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product: ProductSummary,
}

/// A product a client has liked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: WishlistEntryId,
    pub client_id: ClientId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
    pub product: ProductSummary,
}
