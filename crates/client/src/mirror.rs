//! In-memory mirrors of the server-side cart and wishlist.
//!
//! Every mutation goes to the server first, then the mirror re-fetches the
//! authoritative list and broadcasts a [`MirrorEvent`] so other components
//! can refresh. The server is always the source of truth; the mirror never
//! applies a mutation locally.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock, broadcast};

use ziva_core::{
    CheckoutItemInput, CheckoutRequest, ClientId, OrderId, ProductId, ShippingDataInput,
};

use crate::api::StoreApi;
use crate::error::{ClientError, ClientResult};
use crate::identity::{ClientIdentity, QuantityCache};
use crate::types::{CartItem, WishlistItem};

/// Capacity of each mirror's broadcast channel.
const EVENT_CAPACITY: usize = 32;

/// Change notification published by the mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorEvent {
    /// The cart was re-synced; carries the new line count.
    CartUpdated { lines: usize },
    /// The wishlist was re-synced; carries the new entry count.
    WishlistUpdated { entries: usize },
    /// An order was placed from the cart.
    OrderUpdated { order_id: OrderId },
}

// =============================================================================
// Cart
// =============================================================================

/// Cached copy of a client's cart.
pub struct CartMirror {
    api: Arc<dyn StoreApi>,
    client_id: ClientId,
    lines: RwLock<Vec<CartItem>>,
    quantities: RwLock<QuantityCache>,
    identity: Option<Mutex<ClientIdentity>>,
    events: broadcast::Sender<MirrorEvent>,
}

impl CartMirror {
    /// Create an empty mirror. Call [`CartMirror::sync`] to load it.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, client_id: ClientId) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            client_id,
            lines: RwLock::new(Vec::new()),
            quantities: RwLock::new(QuantityCache::default()),
            identity: None,
            events,
        }
    }

    /// Create a mirror for a persisted identity. The quantity cache starts
    /// from the state file and is written back after every sync.
    #[must_use]
    pub fn with_identity(api: Arc<dyn StoreApi>, identity: ClientIdentity) -> Self {
        let mut mirror = Self::new(api, identity.client_id().clone());
        mirror.quantities = RwLock::new(identity.quantities().clone());
        mirror.identity = Some(Mutex::new(identity));
        mirror
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.events.subscribe()
    }

    /// The client this mirror belongs to.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Snapshot of the cached lines.
    pub async fn lines(&self) -> Vec<CartItem> {
        self.lines.read().await.clone()
    }

    /// Snapshot of the cached per-product quantities.
    pub async fn quantities(&self) -> QuantityCache {
        self.quantities.read().await.clone()
    }

    /// Sum of line totals at current catalog prices.
    pub async fn subtotal(&self) -> Decimal {
        self.lines.read().await.iter().map(CartItem::line_total).sum()
    }

    /// Re-fetch the cart from the server and broadcast the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the quantity cache can't be
    /// persisted. The cached lines are left untouched on fetch failure.
    pub async fn sync(&self) -> ClientResult<()> {
        let lines = self.api.cart(&self.client_id).await?;
        let count = lines.len();

        let mut quantities = QuantityCache::default();
        quantities.refresh(&lines);

        *self.lines.write().await = lines;
        *self.quantities.write().await = quantities.clone();

        if let Some(identity) = &self.identity {
            identity.lock().await.store_quantities(quantities)?;
        }

        self.publish(MirrorEvent::CartUpdated { lines: count });
        Ok(())
    }

    /// Add units of a product, then re-sync.
    ///
    /// # Errors
    ///
    /// Returns the server's error (e.g. 409 for insufficient stock) without
    /// touching the cache.
    pub async fn add(&self, product_id: ProductId, quantity: i32) -> ClientResult<()> {
        self.api
            .add_to_cart(&self.client_id, product_id, quantity)
            .await?;
        self.sync().await
    }

    /// Overwrite a line's quantity, then re-sync.
    ///
    /// # Errors
    ///
    /// Returns the server's error without touching the cache.
    pub async fn update(&self, product_id: ProductId, quantity: i32) -> ClientResult<()> {
        self.api
            .update_cart_item(&self.client_id, product_id, quantity)
            .await?;
        self.sync().await
    }

    /// Remove a product, then re-sync.
    ///
    /// # Errors
    ///
    /// Returns the server's error without touching the cache.
    pub async fn remove(&self, product_id: ProductId) -> ClientResult<()> {
        self.api.remove_from_cart(&self.client_id, product_id).await?;
        self.sync().await
    }

    /// Empty the cart, then re-sync.
    ///
    /// # Errors
    ///
    /// Returns the server's error without touching the cache.
    pub async fn clear(&self) -> ClientResult<()> {
        self.api.clear_cart(&self.client_id).await?;
        self.sync().await
    }

    /// Place an order for the cached cart, then clear the cart.
    ///
    /// Prices are the catalog prices the mirror last saw; the server freezes
    /// them into the order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::EmptyCart` if there is nothing to order, or the
    /// server's error if checkout is rejected. A rejected checkout leaves the
    /// cart as it was.
    pub async fn checkout(
        &self,
        email: &str,
        shipping: ShippingDataInput,
    ) -> ClientResult<OrderId> {
        let lines = self.lines().await;
        if lines.is_empty() {
            return Err(ClientError::EmptyCart);
        }

        let request = checkout_request(&self.client_id, email, shipping, &lines);
        let order_id = self.api.create_order(&request).await?;
        tracing::info!(order_id = %order_id, client_id = %self.client_id, "Order placed");

        self.publish(MirrorEvent::OrderUpdated { order_id });
        self.clear().await?;
        Ok(order_id)
    }

    fn publish(&self, event: MirrorEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }
}

/// Build the checkout payload for a cart snapshot.
fn checkout_request(
    client_id: &ClientId,
    email: &str,
    shipping: ShippingDataInput,
    lines: &[CartItem],
) -> CheckoutRequest {
    CheckoutRequest {
        client_id: Some(client_id.to_string()),
        email: Some(email.to_string()),
        shipping_data: Some(shipping),
        items: Some(
            lines
                .iter()
                .map(|line| CheckoutItemInput {
                    product_id: Some(line.product_id),
                    quantity: Some(line.quantity),
                    price: Some(line.product.price),
                })
                .collect(),
        ),
        subtotal: Some(lines.iter().map(CartItem::line_total).sum()),
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// Cached copy of a client's wishlist.
pub struct WishlistMirror {
    api: Arc<dyn StoreApi>,
    client_id: ClientId,
    entries: RwLock<Vec<WishlistItem>>,
    events: broadcast::Sender<MirrorEvent>,
}

impl WishlistMirror {
    /// Create an empty mirror. Call [`WishlistMirror::sync`] to load it.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, client_id: ClientId) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            client_id,
            entries: RwLock::new(Vec::new()),
            events,
        }
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the cached entries.
    pub async fn entries(&self) -> Vec<WishlistItem> {
        self.entries.read().await.clone()
    }

    /// Whether a product is in the cached wishlist.
    pub async fn contains(&self, product_id: ProductId) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|entry| entry.product_id == product_id)
    }

    /// Re-fetch the wishlist from the server and broadcast the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the cache is left untouched.
    pub async fn sync(&self) -> ClientResult<()> {
        let entries = self.api.wishlist(&self.client_id).await?;
        let count = entries.len();
        *self.entries.write().await = entries;

        let _ = self.events.send(MirrorEvent::WishlistUpdated { entries: count });
        Ok(())
    }

    /// Like a product, then re-sync.
    ///
    /// # Errors
    ///
    /// Returns the server's error without touching the cache.
    pub async fn add(&self, product_id: ProductId) -> ClientResult<()> {
        self.api
            .add_to_wishlist(&self.client_id, product_id)
            .await?;
        self.sync().await
    }

    /// Unlike a product, then re-sync.
    ///
    /// # Errors
    ///
    /// Returns the server's error without touching the cache.
    pub async fn remove(&self, product_id: ProductId) -> ClientResult<()> {
        self.api
            .remove_from_wishlist(&self.client_id, product_id)
            .await?;
        self.sync().await
    }

    /// Toggle a product's liked state, then re-sync.
    ///
    /// # Errors
    ///
    /// Returns the server's error without touching the cache.
    pub async fn toggle(&self, product_id: ProductId) -> ClientResult<()> {
        if self.contains(product_id).await {
            self.remove(product_id).await
        } else {
            self.add(product_id).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ziva_core::CartLineId;

    use super::*;
    use crate::types::ProductInfo;

    fn line(product_id: i32, quantity: i32, cents: i64) -> CartItem {
        CartItem {
            id: CartLineId::new(product_id),
            product_id: ProductId::new(product_id),
            quantity,
            product: ProductInfo {
                id: ProductId::new(product_id),
                name: "Rose bush".to_string(),
                description: None,
                price: Decimal::new(cents, 2),
                image_url: None,
                stock: 10,
            },
        }
    }

    #[test]
    fn test_checkout_request_uses_cart_prices() {
        let client_id = ClientId::parse("client-1").unwrap();
        let request = checkout_request(
            &client_id,
            "a@b.co",
            ShippingDataInput::default(),
            &[line(1, 2, 1050), line(2, 1, 300)],
        );

        let items = request.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.first().unwrap().price, Some(Decimal::new(1050, 2)));
        assert_eq!(request.subtotal, Some(Decimal::new(2400, 2)));
        assert_eq!(request.client_id.as_deref(), Some("client-1"));
    }
}
