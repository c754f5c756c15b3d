//! Ziva Client - storefront API client with local state mirrors.
//!
//! # Modules
//!
//! - [`identity`] - Anonymous client ID and quantity cache persisted in a
//!   JSON state file
//! - [`api`] - [`StoreApi`] trait and its reqwest implementation
//! - [`mirror`] - Cart and wishlist mirrors that re-sync after every
//!   mutation and broadcast [`MirrorEvent`]s
//!
//! # Example
//!
//! ```rust,ignore
//! let identity = ClientIdentity::load_or_create("state/client.json")?;
//! let api = Arc::new(HttpStoreApi::new("http://localhost:3000".parse()?)?);
//! let cart = CartMirror::with_identity(api, identity);
//! let mut events = cart.subscribe();
//!
//! cart.add(ProductId::new(1), 2).await?;
//! assert!(matches!(events.recv().await?, MirrorEvent::CartUpdated { .. }));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod error;
pub mod identity;
pub mod mirror;
pub mod types;

pub use api::{HttpStoreApi, StoreApi};
pub use error::{ClientError, ClientResult};
pub use identity::{ClientIdentity, QuantityCache};
pub use mirror::{CartMirror, MirrorEvent, WishlistMirror};
pub use types::{CartItem, OrderLine, OrderView, ProductInfo, WishlistItem};
