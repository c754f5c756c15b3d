//! Checkout and order route handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use ziva_core::{CheckoutRequest, OrderId, OrderStatus};

use super::{
    ApiJson, ApiQuery, ClientQuery, MessageResponse, require_client_id, resolve_client_id,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CookieClientId;
use crate::models::{Order, OrderCreated};
use crate::services::OrderEngine;
use crate::state::AppState;

/// `?clientId=&orderId=` query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub client_id: Option<String>,
    pub order_id: Option<OrderId>,
}

/// Body for a status change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusChangeRequest {
    pub client_id: Option<String>,
    pub order_id: Option<OrderId>,
    pub status: Option<String>,
}

/// Body for deleting an order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderRefRequest {
    pub client_id: Option<String>,
    pub order_id: Option<OrderId>,
}

/// Place an order from a checkout payload.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, ApiJson<OrderCreated>)> {
    let order_id = OrderEngine::new(state.pool()).create_order(request).await?;

    let order = order_id.to_string();
    add_breadcrumb("order", "Order placed", &[("order_id", order.as_str())]);
    Ok((StatusCode::CREATED, ApiJson(OrderCreated { order_id })))
}

/// Get one of the client's orders with its items.
#[instrument(skip(state, cookie))]
pub async fn show(
    State(state): State<AppState>,
    CookieClientId(cookie): CookieClientId,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<ApiJson<Order>> {
    let Some(order_id) = query.order_id else {
        return Err(AppError::BadRequest(
            "Missing or invalid clientId or orderId".to_string(),
        ));
    };
    let client_id = resolve_client_id(query.client_id.as_deref(), cookie)?;

    let order = OrderEngine::new(state.pool())
        .get_order(&client_id, order_id)
        .await?;
    Ok(ApiJson(order))
}

/// List the client's orders, oldest first.
#[instrument(skip(state, cookie))]
pub async fn list(
    State(state): State<AppState>,
    CookieClientId(cookie): CookieClientId,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> Result<ApiJson<Vec<Order>>> {
    let client_id = resolve_client_id(query.client_id.as_deref(), cookie)?;
    let orders = OrderEngine::new(state.pool()).list_orders(&client_id).await?;
    Ok(ApiJson(orders))
}

/// Move one of the client's orders along its lifecycle.
#[instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StatusChangeRequest>,
) -> Result<ApiJson<Order>> {
    const REQUIRED: &str = "Missing required fields: clientId, orderId, or status";

    let (Some(order_id), Some(status)) = (body.order_id, body.status.as_deref()) else {
        return Err(AppError::BadRequest(REQUIRED.to_string()));
    };
    let client_id = require_client_id(body.client_id.as_deref(), REQUIRED)?;
    let status: OrderStatus = status.parse().map_err(AppError::BadRequest)?;

    let order = OrderEngine::new(state.pool())
        .update_status(&client_id, order_id, status)
        .await?;
    Ok(ApiJson(order))
}

/// Delete one of the client's orders.
#[instrument(skip(state, body))]
pub async fn delete(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<OrderRefRequest>,
) -> Result<ApiJson<MessageResponse>> {
    const REQUIRED: &str = "Missing required fields: clientId or orderId";

    let Some(order_id) = body.order_id else {
        return Err(AppError::BadRequest(REQUIRED.to_string()));
    };
    let client_id = require_client_id(body.client_id.as_deref(), REQUIRED)?;

    OrderEngine::new(state.pool())
        .delete_order(&client_id, order_id)
        .await?;
    Ok(ApiJson(MessageResponse {
        message: "Order deleted",
    }))
}
