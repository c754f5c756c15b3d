//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart mutations checked against the catalog
//! - `wishlist` - Liked products
//! - `orders` - Checkout and order lifecycle

pub mod cart;
pub mod orders;
pub mod wishlist;

pub use cart::{CartError, CartService};
pub use orders::{OrderEngine, OrderError};
pub use wishlist::WishlistService;
