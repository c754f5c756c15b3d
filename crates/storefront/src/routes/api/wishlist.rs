//! Wishlist route handlers.

use axum::extract::State;
use tracing::instrument;

use super::cart::CartItemRequest;
use super::{
    ApiJson, ApiQuery, ClientQuery, RemovedResponse, require_client_id, resolve_client_id,
};
use crate::error::{AppError, Result};
use crate::middleware::CookieClientId;
use crate::models::WishlistEntry;
use crate::services::WishlistService;
use crate::state::AppState;

const ITEM_FIELDS_REQUIRED: &str = "clientId and productId are required";

/// Get the client's wishlist.
#[instrument(skip(state, cookie))]
pub async fn show(
    State(state): State<AppState>,
    CookieClientId(cookie): CookieClientId,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> Result<ApiJson<Vec<WishlistEntry>>> {
    let client_id = resolve_client_id(query.client_id.as_deref(), cookie)?;
    let entries = WishlistService::new(state.pool()).get(&client_id).await?;
    Ok(ApiJson(entries))
}

/// Like a product. Liking it again returns the existing entry.
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<ApiJson<WishlistEntry>> {
    let Some(product_id) = body.product_id else {
        return Err(AppError::BadRequest(ITEM_FIELDS_REQUIRED.to_string()));
    };
    let client_id = require_client_id(body.client_id.as_deref(), ITEM_FIELDS_REQUIRED)?;

    let entry = WishlistService::new(state.pool())
        .add(&client_id, product_id)
        .await?;
    Ok(ApiJson(entry))
}

/// Unlike a product.
#[instrument(skip(state, body))]
pub async fn remove(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<ApiJson<RemovedResponse>> {
    let Some(product_id) = body.product_id else {
        return Err(AppError::BadRequest(ITEM_FIELDS_REQUIRED.to_string()));
    };
    let client_id = require_client_id(body.client_id.as_deref(), ITEM_FIELDS_REQUIRED)?;

    let removed = WishlistService::new(state.pool())
        .remove(&client_id, product_id)
        .await?;
    Ok(ApiJson(RemovedResponse {
        message: "Item removed from wishlist",
        removed,
    }))
}
