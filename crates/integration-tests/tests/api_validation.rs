//! HTTP contract tests that never reach the database.
//!
//! Every request here is rejected (or answered) before a query runs, so the
//! router is built on a pool that can't connect.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header::SET_COOKIE};
use serde_json::json;

use ziva_integration_tests::{TEST_ADMIN_TOKEN, get, json_request, lazy_state, send};

fn app() -> axum::Router {
    ziva_storefront::app(lazy_state(None))
}

fn error_message(body: &serde_json::Value) -> &str {
    body["error"].as_str().unwrap()
}

// =============================================================================
// Health and middleware
// =============================================================================

#[tokio::test]
async fn test_health_is_ok_without_database() {
    let (status, _, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_readiness_reports_unavailable_database() {
    let (status, _, _) = send(app(), get("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_security_headers_present() {
    let (_, headers, _) = send(app(), get("/health")).await;
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-store, max-age=0");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "proxy-1234")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(app(), request).await;
    assert_eq!(headers["x-request-id"], "proxy-1234");
}

#[tokio::test]
async fn test_request_id_generated_when_absent() {
    let (_, headers, _) = send(app(), get("/health")).await;
    assert!(!headers["x-request-id"].is_empty());
}

// =============================================================================
// Cart and wishlist
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_requires_all_fields() {
    let (status, headers, body) = send(
        app(),
        json_request("POST", "/api/cart", &json!({ "clientId": "abc" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "clientId, productId, and quantity are required"
    );
    // First contact mints the identity cookie even on a rejected request.
    let cookie = headers[SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("clientId="));
}

#[tokio::test]
async fn test_existing_cookie_is_not_reissued() {
    let request = Request::builder()
        .uri("/api/order")
        .header("cookie", "clientId=abc-123")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_cart_rejects_unknown_fields() {
    let (status, _, body) = send(
        app(),
        json_request(
            "POST",
            "/api/cart",
            &json!({ "clientId": "abc", "productId": 1, "quantity": 1, "colour": "red" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("unknown field"));
}

#[tokio::test]
async fn test_cart_rejects_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/cart")
        .header("content-type", "application/json")
        .body(Body::from("{\"clientId\": "))
        .unwrap();
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_cart_rejects_malformed_client_id() {
    let (status, _, _) = send(
        app(),
        json_request(
            "POST",
            "/api/cart",
            &json!({ "clientId": "a b", "productId": 1, "quantity": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_from_cart_requires_product() {
    let (status, _, body) = send(
        app(),
        json_request("DELETE", "/api/cart", &json!({ "clientId": "abc" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "clientId and productId are required");
}

#[tokio::test]
async fn test_wishlist_add_requires_product() {
    let (status, _, body) = send(
        app(),
        json_request("POST", "/api/wishlist", &json!({ "clientId": "abc" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "clientId and productId are required");
}

// =============================================================================
// Checkout and orders
// =============================================================================

fn checkout_body(email: &str) -> serde_json::Value {
    json!({
        "clientId": "client-1",
        "email": email,
        "shippingData": {
            "fullname": "Amina Wanjiru",
            "phone": "+254700000000",
            "country": "Kenya",
            "state": "Nairobi",
            "address": "12 Riverside Drive",
            "city": "Nairobi",
            "postalCode": "00100"
        },
        "items": [{ "productId": 1, "quantity": 1, "price": "850.00" }],
        "subtotal": "850.00"
    })
}

#[tokio::test]
async fn test_checkout_lists_missing_fields() {
    let (status, _, body) = send(app(), json_request("POST", "/api/order", &json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "Missing required fields: clientId, email, shippingData, items, subtotal"
    );
}

#[tokio::test]
async fn test_checkout_rejects_invalid_email() {
    let (status, _, body) = send(
        app(),
        json_request("POST", "/api/order", &checkout_body("not-an-email")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Invalid email address"));
}

#[tokio::test]
async fn test_checkout_rejects_empty_items() {
    let mut body = checkout_body("amina@example.com");
    body["items"] = json!([]);
    let (status, _, body) = send(app(), json_request("POST", "/api/order", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Items must be a non-empty array");
}

#[tokio::test]
async fn test_checkout_rejects_missing_shipping_fields() {
    let mut body = checkout_body("amina@example.com");
    body["shippingData"]["city"] = json!("  ");
    let (status, _, body) = send(app(), json_request("POST", "/api/order", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Missing required shipping fields: city");
}

#[tokio::test]
async fn test_checkout_rejects_price_beyond_order_columns() {
    let mut body = checkout_body("amina@example.com");
    body["items"][0]["price"] = json!("70000000000000000000000000000");
    let (status, _, body) = send(app(), json_request("POST", "/api/order", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "Invalid item data at index 0: price must have at most 2 decimal places and not exceed 9999999999.99"
    );
}

#[tokio::test]
async fn test_checkout_rejects_subpenny_subtotal() {
    let mut body = checkout_body("amina@example.com");
    body["subtotal"] = json!("850.005");
    let (status, _, body) = send(app(), json_request("POST", "/api/order", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("subtotal must have at most 2 decimal places"));
}

#[tokio::test]
async fn test_get_order_requires_order_id() {
    let (status, _, body) = send(app(), get("/api/order?clientId=abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Missing or invalid clientId or orderId");
}

#[tokio::test]
async fn test_update_status_rejects_unknown_status() {
    let (status, _, body) = send(
        app(),
        json_request(
            "PUT",
            "/api/order",
            &json!({ "clientId": "abc", "orderId": 1, "status": "LOST" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "invalid order status: LOST");
}

#[tokio::test]
async fn test_delete_order_requires_order_id() {
    let (status, _, body) = send(
        app(),
        json_request("DELETE", "/api/order", &json!({ "clientId": "abc" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "Missing required fields: clientId or orderId"
    );
}

#[tokio::test]
async fn test_product_id_must_be_numeric() {
    let (status, _, _) = send(app(), get("/api/products/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_disabled_without_token() {
    let (status, headers, body) = send(app(), get("/api/admin/orders")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "Admin API is disabled");
    assert!(headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_admin_rejects_wrong_token() {
    let app = ziva_storefront::app(lazy_state(Some(TEST_ADMIN_TOKEN)));
    let request = Request::builder()
        .uri("/api/admin/orders")
        .header("authorization", "Bearer not-the-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "Invalid or missing admin token");
}

#[tokio::test]
async fn test_admin_create_category_requires_name() {
    let app = ziva_storefront::app(lazy_state(Some(TEST_ADMIN_TOKEN)));
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/categories")
        .header("authorization", format!("Bearer {TEST_ADMIN_TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "   " }).to_string()))
        .unwrap();
    let (status, _, _) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
