//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (binary only)
//! 2. Rate limiting (binary only, needs the peer address)
//! 3. `TraceLayer` (request span)
//! 4. Request ID (recorded into the span)
//! 5. Security headers
//! 6. Client ID cookie (`/api` routes)

pub mod admin_auth;
pub mod client_id;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use admin_auth::RequireAdmin;
pub use client_id::{CookieClientId, client_id_middleware};
pub use rate_limit::api_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
