//! Client mirrors against an in-memory store.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use ziva_client::{
    CartItem, CartMirror, ClientError, ClientIdentity, ClientResult, MirrorEvent, ProductInfo,
    StoreApi, WishlistItem, WishlistMirror,
};
use ziva_core::{
    CartLineId, CheckoutRequest, ClientId, OrderId, ProductId, ShippingDataInput, WishlistEntryId,
};

/// Single-client store: product id to (stock, price).
#[derive(Default)]
struct FakeStore {
    catalog: BTreeMap<ProductId, (i32, Decimal)>,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    cart: BTreeMap<ProductId, i32>,
    wishlist: Vec<ProductId>,
    orders: Vec<CheckoutRequest>,
    cart_fetches: usize,
}

impl FakeStore {
    fn with_product(mut self, id: i32, stock: i32, price: Decimal) -> Self {
        self.catalog.insert(ProductId::new(id), (stock, price));
        self
    }

    fn info(&self, product_id: ProductId) -> ClientResult<ProductInfo> {
        let (stock, price) = self.catalog.get(&product_id).ok_or_else(|| ClientError::Api {
            status: 404,
            message: format!("Product not found: ID {product_id}"),
        })?;
        Ok(ProductInfo {
            id: product_id,
            name: format!("Product {product_id}"),
            description: None,
            price: *price,
            image_url: None,
            stock: *stock,
        })
    }

    fn line(&self, product_id: ProductId, quantity: i32) -> ClientResult<CartItem> {
        Ok(CartItem {
            id: CartLineId::new(product_id.as_i32()),
            product_id,
            quantity,
            product: self.info(product_id)?,
        })
    }

    fn cart_fetches(&self) -> usize {
        self.inner.lock().unwrap().cart_fetches
    }
}

#[async_trait]
impl StoreApi for FakeStore {
    async fn cart(&self, _client_id: &ClientId) -> ClientResult<Vec<CartItem>> {
        let cart = {
            let mut inner = self.inner.lock().unwrap();
            inner.cart_fetches += 1;
            inner.cart.clone()
        };
        cart.into_iter()
            .map(|(product_id, quantity)| self.line(product_id, quantity))
            .collect()
    }

    async fn add_to_cart(
        &self,
        _client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> ClientResult<CartItem> {
        let info = self.info(product_id)?;
        if quantity > info.stock {
            return Err(ClientError::Api {
                status: 409,
                message: format!(
                    "Insufficient stock for product ID {product_id}. Available: {}",
                    info.stock
                ),
            });
        }
        let total = {
            let mut inner = self.inner.lock().unwrap();
            let line = inner.cart.entry(product_id).or_insert(0);
            *line += quantity;
            *line
        };
        self.line(product_id, total)
    }

    async fn update_cart_item(
        &self,
        _client_id: &ClientId,
        product_id: ProductId,
        quantity: i32,
    ) -> ClientResult<CartItem> {
        {
            let mut inner = self.inner.lock().unwrap();
            let line = inner.cart.get_mut(&product_id).ok_or_else(|| ClientError::Api {
                status: 404,
                message: format!("Cart item with productId {product_id} not found"),
            })?;
            *line = quantity;
        }
        self.line(product_id, quantity)
    }

    async fn remove_from_cart(&self, _client_id: &ClientId, product_id: ProductId) -> ClientResult<()> {
        self.inner.lock().unwrap().cart.remove(&product_id);
        Ok(())
    }

    async fn clear_cart(&self, _client_id: &ClientId) -> ClientResult<()> {
        self.inner.lock().unwrap().cart.clear();
        Ok(())
    }

    async fn wishlist(&self, _client_id: &ClientId) -> ClientResult<Vec<WishlistItem>> {
        let liked = self.inner.lock().unwrap().wishlist.clone();
        liked
            .into_iter()
            .map(|product_id| {
                Ok(WishlistItem {
                    id: WishlistEntryId::new(product_id.as_i32()),
                    product_id,
                    product: self.info(product_id)?,
                })
            })
            .collect()
    }

    async fn add_to_wishlist(
        &self,
        _client_id: &ClientId,
        product_id: ProductId,
    ) -> ClientResult<WishlistItem> {
        let product = self.info(product_id)?;
        let mut inner = self.inner.lock().unwrap();
        if !inner.wishlist.contains(&product_id) {
            inner.wishlist.push(product_id);
        }
        Ok(WishlistItem {
            id: WishlistEntryId::new(product_id.as_i32()),
            product_id,
            product,
        })
    }

    async fn remove_from_wishlist(
        &self,
        _client_id: &ClientId,
        product_id: ProductId,
    ) -> ClientResult<()> {
        self.inner
            .lock()
            .unwrap()
            .wishlist
            .retain(|id| *id != product_id);
        Ok(())
    }

    async fn create_order(&self, request: &CheckoutRequest) -> ClientResult<OrderId> {
        let mut inner = self.inner.lock().unwrap();
        inner.orders.push(request.clone());
        Ok(OrderId::new(i32::try_from(inner.orders.len()).unwrap()))
    }
}

fn store() -> Arc<FakeStore> {
    Arc::new(
        FakeStore::default()
            .with_product(1, 5, Decimal::new(85_000, 2))
            .with_product(2, 100, Decimal::new(9_000, 2)),
    )
}

fn shipping() -> ShippingDataInput {
    ShippingDataInput {
        fullname: Some("Amina Wanjiru".to_string()),
        phone: Some("+254700000000".to_string()),
        country: Some("Kenya".to_string()),
        state: Some("Nairobi".to_string()),
        address: Some("12 Riverside Drive".to_string()),
        city: Some("Nairobi".to_string()),
        postal_code: Some("00100".to_string()),
        ..ShippingDataInput::default()
    }
}

// =============================================================================
// Cart mirror
// =============================================================================

#[tokio::test]
async fn test_every_mutation_resyncs_and_broadcasts() {
    let store = store();
    let cart = CartMirror::new(store.clone(), ClientId::generate());
    let mut events = cart.subscribe();

    cart.add(ProductId::new(1), 2).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), MirrorEvent::CartUpdated { lines: 1 });

    cart.add(ProductId::new(2), 10).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), MirrorEvent::CartUpdated { lines: 2 });

    cart.update(ProductId::new(2), 3).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), MirrorEvent::CartUpdated { lines: 2 });

    cart.remove(ProductId::new(1)).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), MirrorEvent::CartUpdated { lines: 1 });

    assert_eq!(store.cart_fetches(), 4);
    assert_eq!(cart.subtotal().await, Decimal::new(27_000, 2));
}

#[tokio::test]
async fn test_quantity_cache_tracks_server_lines() {
    let cart = CartMirror::new(store(), ClientId::generate());

    cart.add(ProductId::new(1), 2).await.unwrap();
    cart.add(ProductId::new(1), 1).await.unwrap();
    cart.add(ProductId::new(2), 4).await.unwrap();

    let quantities = cart.quantities().await;
    assert_eq!(quantities.get(ProductId::new(1)), 3);
    assert_eq!(quantities.get(ProductId::new(2)), 4);
    assert_eq!(quantities.get(ProductId::new(9)), 0);
    assert_eq!(quantities.total(), 7);
}

#[tokio::test]
async fn test_rejected_mutation_leaves_cache_untouched() {
    let store = store();
    let cart = CartMirror::new(store.clone(), ClientId::generate());
    cart.add(ProductId::new(1), 2).await.unwrap();
    let before = cart.lines().await;
    let fetches = store.cart_fetches();

    let err = cart.add(ProductId::new(1), 6).await.unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(cart.lines().await, before);
    assert_eq!(store.cart_fetches(), fetches);
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let store = store();
    let cart = CartMirror::new(store.clone(), ClientId::generate());
    cart.add(ProductId::new(1), 2).await.unwrap();
    cart.add(ProductId::new(2), 1).await.unwrap();
    let mut events = cart.subscribe();

    let order_id = cart.checkout("amina@example.com", shipping()).await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        MirrorEvent::OrderUpdated { order_id }
    );
    assert_eq!(events.recv().await.unwrap(), MirrorEvent::CartUpdated { lines: 0 });
    assert!(cart.lines().await.is_empty());
    assert!(cart.quantities().await.is_empty());

    let inner = store.inner.lock().unwrap();
    let placed = inner.orders.first().unwrap();
    assert_eq!(placed.subtotal, Some(Decimal::new(179_000, 2)));
    assert_eq!(placed.items.as_ref().unwrap().len(), 2);
}

#[tokio::test]
async fn test_checkout_refuses_empty_cart() {
    let store = store();
    let cart = CartMirror::new(store.clone(), ClientId::generate());

    let err = cart.checkout("amina@example.com", shipping()).await.unwrap_err();

    assert!(matches!(err, ClientError::EmptyCart));
    assert!(store.inner.lock().unwrap().orders.is_empty());
}

#[tokio::test]
async fn test_quantities_persist_to_identity_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.json");
    let identity = ClientIdentity::load_or_create(&path).unwrap();
    let client_id = identity.client_id().clone();

    let cart = CartMirror::with_identity(store(), identity);
    cart.add(ProductId::new(2), 5).await.unwrap();

    let reloaded = ClientIdentity::load_or_create(&path).unwrap();
    assert_eq!(reloaded.client_id(), &client_id);
    assert_eq!(reloaded.quantities().get(ProductId::new(2)), 5);
}

// =============================================================================
// Wishlist mirror
// =============================================================================

#[tokio::test]
async fn test_wishlist_toggle() {
    let wishlist = WishlistMirror::new(store(), ClientId::generate());
    let mut events = wishlist.subscribe();
    let product = ProductId::new(1);

    wishlist.toggle(product).await.unwrap();
    assert!(wishlist.contains(product).await);
    assert_eq!(
        events.recv().await.unwrap(),
        MirrorEvent::WishlistUpdated { entries: 1 }
    );

    wishlist.toggle(product).await.unwrap();
    assert!(!wishlist.contains(product).await);
    assert_eq!(
        events.recv().await.unwrap(),
        MirrorEvent::WishlistUpdated { entries: 0 }
    );
}

#[tokio::test]
async fn test_wishlist_unknown_product_is_reported() {
    let wishlist = WishlistMirror::new(store(), ClientId::generate());

    let err = wishlist.add(ProductId::new(42)).await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(wishlist.entries().await.is_empty());
}
