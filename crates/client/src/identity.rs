//! Persistent client identity and quantity cache.
//!
//! The state file is a small JSON document holding the anonymous client ID
//! and the last known quantity of each product in the cart:
//!
//! ```json
//! { "clientId": "7f0c...", "cartQuantities": { "12": 3 } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ziva_core::{ClientId, ProductId};

use crate::error::ClientResult;
use crate::types::CartItem;

/// Per-product quantities as last seen in the authoritative cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuantityCache(BTreeMap<ProductId, i32>);

impl QuantityCache {
    /// Cached quantity for a product (0 if it isn't in the cart).
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> i32 {
        self.0.get(&product_id).copied().unwrap_or(0)
    }

    /// Total number of units across all products.
    #[must_use]
    pub fn total(&self) -> i32 {
        self.0.values().sum()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace the cache with the quantities of `lines`.
    pub fn refresh(&mut self, lines: &[CartItem]) {
        self.0 = lines
            .iter()
            .map(|line| (line.product_id, line.quantity))
            .collect();
    }
}

/// On-disk layout of the state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFile {
    client_id: String,
    #[serde(default)]
    cart_quantities: QuantityCache,
}

/// The anonymous identity of this client, persisted across runs.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    path: PathBuf,
    client_id: ClientId,
    quantities: QuantityCache,
}

impl ClientIdentity {
    /// Load the identity from `path`, creating it with a fresh UUIDv4 client
    /// ID if the file doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or written, isn't valid
    /// JSON, or holds a malformed client ID.
    pub fn load_or_create(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let state: StateFile = serde_json::from_str(&fs::read_to_string(&path)?)?;
            let client_id = ClientId::parse(&state.client_id)?;
            tracing::debug!(client_id = %client_id, "Loaded client identity");
            return Ok(Self {
                path,
                client_id,
                quantities: state.cart_quantities,
            });
        }

        let identity = Self {
            path,
            client_id: ClientId::generate(),
            quantities: QuantityCache::default(),
        };
        identity.save()?;
        tracing::info!(client_id = %identity.client_id, "Generated new client identity");
        Ok(identity)
    }

    /// The client ID.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// `Cookie` header value carrying the client ID.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!("clientId={}", self.client_id)
    }

    /// The persisted quantity cache.
    #[must_use]
    pub const fn quantities(&self) -> &QuantityCache {
        &self.quantities
    }

    /// Replace the quantity cache and write it to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file can't be written.
    pub fn store_quantities(&mut self, quantities: QuantityCache) -> ClientResult<()> {
        self.quantities = quantities;
        self.save()
    }

    fn save(&self) -> ClientResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let state = StateFile {
            client_id: self.client_id.to_string(),
            cart_quantities: self.quantities.clone(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use ziva_core::CartLineId;

    use super::*;
    use crate::types::ProductInfo;

    fn line(product_id: i32, quantity: i32) -> CartItem {
        CartItem {
            id: CartLineId::new(product_id),
            product_id: ProductId::new(product_id),
            quantity,
            product: ProductInfo {
                id: ProductId::new(product_id),
                name: format!("Product {product_id}"),
                description: None,
                price: Decimal::new(1000, 2),
                image_url: None,
                stock: 10,
            },
        }
    }

    #[test]
    fn test_creates_then_reloads_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("client.json");

        let first = ClientIdentity::load_or_create(&path).unwrap();
        assert_eq!(first.client_id().as_str().len(), 36);
        assert!(path.exists());

        let second = ClientIdentity::load_or_create(&path).unwrap();
        assert_eq!(first.client_id(), second.client_id());
    }

    #[test]
    fn test_quantities_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");

        let mut identity = ClientIdentity::load_or_create(&path).unwrap();
        let mut cache = QuantityCache::default();
        cache.refresh(&[line(3, 2), line(5, 1)]);
        identity.store_quantities(cache).unwrap();

        let reloaded = ClientIdentity::load_or_create(&path).unwrap();
        assert_eq!(reloaded.quantities().get(ProductId::new(3)), 2);
        assert_eq!(reloaded.quantities().total(), 3);
    }

    #[test]
    fn test_rejects_tampered_client_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        fs::write(&path, r#"{"clientId": "abc;drop"}"#).unwrap();

        assert!(ClientIdentity::load_or_create(&path).is_err());
    }

    #[test]
    fn test_cookie_header() {
        let dir = tempfile::tempdir().unwrap();
        let identity = ClientIdentity::load_or_create(dir.path().join("c.json")).unwrap();
        assert_eq!(
            identity.cookie_header(),
            format!("clientId={}", identity.client_id())
        );
    }

    #[test]
    fn test_refresh_drops_removed_products() {
        let mut cache = QuantityCache::default();
        cache.refresh(&[line(1, 4)]);
        cache.refresh(&[line(2, 1)]);
        assert_eq!(cache.get(ProductId::new(1)), 0);
        assert_eq!(cache.get(ProductId::new(2)), 1);
    }
}
