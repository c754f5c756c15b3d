//! Ziva Landscaping storefront library.
//!
//! This crate provides the storefront JSON API as a library, allowing it to
//! be tested and reused. [`app`] builds the complete router; the binary adds
//! Sentry, rate limiting and the listener around it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Build the storefront router with its request-scoped middleware.
///
/// Layer order, outermost first: tracing span, request ID, security headers,
/// then the routes (the client ID cookie applies to `/api` only).
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .nest("/api", routes::api_routes(&state))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
