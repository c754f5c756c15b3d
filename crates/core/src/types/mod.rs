//! Core types for the Ziva storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod client_id;
pub mod email;
pub mod id;
pub mod slug;
pub mod status;

pub use client_id::{ClientId, ClientIdError};
pub use email::{Email, EmailError};
pub use id::*;
pub use slug::slugify;
pub use status::*;
