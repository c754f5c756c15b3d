//! Ziva Core - Shared domain types.
//!
//! This crate provides the types used across all Ziva storefront components:
//! - `storefront` - JSON API server (catalog, cart, wishlist, orders)
//! - `client` - Client identity and cart/wishlist mirrors
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, client identifiers, emails, order
//!   status and URL slugs
//! - [`checkout`] - Checkout request schema and its validation sequence

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod types;

pub use checkout::{
    Checkout, CheckoutError, CheckoutItem, CheckoutItemInput, CheckoutRequest, MAX_AMOUNT,
    ShippingAddress, ShippingDataInput, fits_amount,
};
pub use types::*;
