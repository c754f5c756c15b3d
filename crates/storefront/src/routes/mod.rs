//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness check
//! GET    /health/ready                    - Readiness check (database)
//!
//! # Catalog
//! GET    /api/categories                  - Navigation menu
//! GET    /api/categories/{category}       - Category with sub-categories and products
//! GET    /api/categories/{category}/{sub} - Sub-category page (?tag=)
//! GET    /api/products                    - Product listing (?tag=&subCategoryId=)
//! GET    /api/products/{id}               - Product detail
//!
//! # Cart
//! GET    /api/cart                        - Cart lines (?clientId=, cookie fallback)
//! POST   /api/cart                        - Add to cart
//! PUT    /api/cart                        - Set line quantity
//! DELETE /api/cart                        - Remove line
//! DELETE /api/cart/clear                  - Empty cart
//!
//! # Wishlist
//! GET    /api/wishlist                    - Wishlist entries
//! POST   /api/wishlist                    - Like a product
//! DELETE /api/wishlist                    - Unlike a product
//!
//! # Orders
//! POST   /api/order                       - Checkout
//! GET    /api/order                       - One order (?clientId=&orderId=)
//! PUT    /api/order                       - Change order status
//! DELETE /api/order                       - Delete order
//! GET    /api/orders                      - Client's orders
//!
//! # Admin (bearer token)
//! GET|POST   /api/admin/categories
//! GET|POST   /api/admin/subcategories
//! GET|POST   /api/admin/products
//! PUT|DELETE /api/admin/products/{id}
//! GET        /api/admin/orders
//! PUT        /api/admin/orders/{id}/status
//! ```

pub mod api;
pub mod health;

use axum::{Router, middleware::from_fn_with_state, routing::get};

use crate::middleware::client_id_middleware;
use crate::state::AppState;

/// Create the storefront API router (mounted under `/api`).
///
/// Client-facing routes get the client ID cookie; admin routes don't.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let client_routes = Router::new()
        .route("/categories", get(api::categories::navigation))
        .route("/categories/{category}", get(api::categories::category))
        .route(
            "/categories/{category}/{sub_category}",
            get(api::categories::sub_category),
        )
        .route("/products", get(api::products::list))
        .route("/products/{id}", get(api::products::show))
        .route(
            "/cart",
            get(api::cart::show)
                .post(api::cart::add)
                .put(api::cart::update)
                .delete(api::cart::remove),
        )
        .route("/cart/clear", axum::routing::delete(api::cart::clear))
        .route(
            "/wishlist",
            get(api::wishlist::show)
                .post(api::wishlist::add)
                .delete(api::wishlist::remove),
        )
        .route(
            "/order",
            get(api::order::show)
                .post(api::order::create)
                .put(api::order::update_status)
                .delete(api::order::delete),
        )
        .route("/orders", get(api::order::list))
        .layer(from_fn_with_state(state.clone(), client_id_middleware));

    client_routes.nest("/admin", api::admin::routes())
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
