//! Cart route handlers.
//!
//! Reads accept `?clientId=` and fall back to the `clientId` cookie.
//! Mutations name the client in the body.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use ziva_core::ProductId;

use super::{
    ApiJson, ApiQuery, ClientQuery, RemovedResponse, require_client_id, resolve_client_id,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CookieClientId;
use crate::models::CartLine;
use crate::services::CartService;
use crate::state::AppState;

const LINE_FIELDS_REQUIRED: &str = "clientId, productId, and quantity are required";
const ITEM_FIELDS_REQUIRED: &str = "clientId and productId are required";

/// Body for add and set-quantity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CartLineRequest {
    pub client_id: Option<String>,
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

/// Body for removing a line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CartItemRequest {
    pub client_id: Option<String>,
    pub product_id: Option<ProductId>,
}

/// Body for clearing the cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientRequest {
    pub client_id: Option<String>,
}

/// Get the client's cart lines.
#[instrument(skip(state, cookie))]
pub async fn show(
    State(state): State<AppState>,
    CookieClientId(cookie): CookieClientId,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> Result<ApiJson<Vec<CartLine>>> {
    let client_id = resolve_client_id(query.client_id.as_deref(), cookie)?;
    let lines = CartService::new(state.pool()).get(&client_id).await?;
    Ok(ApiJson(lines))
}

/// Add a product to the cart, merging with an existing line.
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CartLineRequest>,
) -> Result<ApiJson<CartLine>> {
    let (Some(product_id), Some(quantity)) = (body.product_id, body.quantity) else {
        return Err(AppError::BadRequest(LINE_FIELDS_REQUIRED.to_string()));
    };
    let client_id = require_client_id(body.client_id.as_deref(), LINE_FIELDS_REQUIRED)?;

    let line = CartService::new(state.pool())
        .add(&client_id, product_id, quantity)
        .await?;

    let (product, quantity) = (product_id.to_string(), quantity.to_string());
    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("product_id", product.as_str()), ("quantity", quantity.as_str())],
    );
    Ok(ApiJson(line))
}

/// Overwrite the quantity of an existing line.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CartLineRequest>,
) -> Result<ApiJson<CartLine>> {
    let (Some(product_id), Some(quantity)) = (body.product_id, body.quantity) else {
        return Err(AppError::BadRequest(LINE_FIELDS_REQUIRED.to_string()));
    };
    let client_id = require_client_id(body.client_id.as_deref(), LINE_FIELDS_REQUIRED)?;

    let line = CartService::new(state.pool())
        .set_quantity(&client_id, product_id, quantity)
        .await?;
    Ok(ApiJson(line))
}

/// Remove a product's line.
#[instrument(skip(state, body))]
pub async fn remove(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<ApiJson<RemovedResponse>> {
    let Some(product_id) = body.product_id else {
        return Err(AppError::BadRequest(ITEM_FIELDS_REQUIRED.to_string()));
    };
    let client_id = require_client_id(body.client_id.as_deref(), ITEM_FIELDS_REQUIRED)?;

    let removed = CartService::new(state.pool())
        .remove(&client_id, product_id)
        .await?;

    let product = product_id.to_string();
    add_breadcrumb(
        "cart",
        "Removed from cart",
        &[("product_id", product.as_str())],
    );
    Ok(ApiJson(RemovedResponse {
        message: "Item removed from cart",
        removed,
    }))
}

/// Remove every line from the cart.
#[instrument(skip(state, body))]
pub async fn clear(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ClientRequest>,
) -> Result<ApiJson<RemovedResponse>> {
    let client_id = require_client_id(body.client_id.as_deref(), "clientId is required")?;

    let removed = CartService::new(state.pool()).clear(&client_id).await?;
    Ok(ApiJson(RemovedResponse {
        message: "Cart cleared",
        removed,
    }))
}
