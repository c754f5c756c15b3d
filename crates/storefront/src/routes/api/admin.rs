//! Admin API: catalog maintenance and order fulfilment.
//!
//! Every handler takes [`RequireAdmin`], so requests without the configured
//! bearer token are rejected before any work is done.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ziva_core::{OrderId, OrderStatus, ProductId};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    Category, NewCategory, NewProduct, NewSubCategory, Order, Product, ProductFilter,
    ProductUpdate, SubCategory,
};
use crate::services::OrderEngine;
use crate::state::AppState;

/// Default number of orders returned by the admin listing.
const DEFAULT_ORDER_LIMIT: i64 = 100;
/// Upper bound on `?limit=`.
const MAX_ORDER_LIMIT: i64 = 500;

/// Create the admin router (mounted under `/api/admin`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/subcategories",
            get(list_sub_categories).post(create_sub_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            put(update_product).delete(delete_product),
        )
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", put(set_order_status))
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    Ok(())
}

// =============================================================================
// Catalog
// =============================================================================

#[instrument(skip(state, _admin))]
async fn list_categories(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<ApiJson<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(ApiJson(categories))
}

#[instrument(skip(state, _admin, input), fields(name = %input.name))]
async fn create_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCategory>,
) -> Result<(StatusCode, ApiJson<Category>)> {
    require_name(&input.name)?;
    let category = CatalogRepository::new(state.pool())
        .create_category(&input)
        .await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, ApiJson(category)))
}

#[instrument(skip(state, _admin))]
async fn list_sub_categories(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<ApiJson<Vec<SubCategory>>> {
    let sub_categories = CatalogRepository::new(state.pool())
        .list_sub_categories()
        .await?;
    Ok(ApiJson(sub_categories))
}

#[instrument(skip(state, _admin, input), fields(name = %input.name))]
async fn create_sub_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewSubCategory>,
) -> Result<(StatusCode, ApiJson<SubCategory>)> {
    require_name(&input.name)?;
    let sub_category = CatalogRepository::new(state.pool())
        .create_sub_category(&input)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound(format!("Category not found: ID {}", input.category_id))
            }
            other => other.into(),
        })?;
    tracing::info!(sub_category_id = %sub_category.id, "Sub-category created");
    Ok((StatusCode::CREATED, ApiJson(sub_category)))
}

#[instrument(skip(state, _admin))]
async fn list_products(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<ApiJson<Vec<Product>>> {
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(ApiJson(products))
}

#[instrument(skip(state, _admin, input), fields(name = %input.name))]
async fn create_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, ApiJson<Product>)> {
    input.validate().map_err(AppError::BadRequest)?;
    let product = CatalogRepository::new(state.pool())
        .create_product(&input)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!(
                "Subcategory not found: ID {}",
                input.sub_category_id
            )),
            other => other.into(),
        })?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, ApiJson(product)))
}

#[instrument(skip(state, _admin, update))]
async fn update_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<ApiJson<Product>> {
    update.validate().map_err(AppError::BadRequest)?;
    let product = CatalogRepository::new(state.pool())
        .update_product(id, &update)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("Product not found: ID {id}")),
            other => other.into(),
        })?;
    Ok(ApiJson(product))
}

#[instrument(skip(state, _admin))]
async fn delete_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool())
        .delete_product(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("Product not found: ID {id}")),
            other => other.into(),
        })?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders
// =============================================================================

/// `?limit=` for the order listing.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Body for an admin status change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminStatusRequest {
    pub status: OrderStatus,
}

/// Result of an admin status change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

#[instrument(skip(state, _admin))]
async fn list_orders(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<ApiJson<Vec<Order>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ORDER_LIMIT)
        .clamp(1, MAX_ORDER_LIMIT);
    let orders = OrderEngine::new(state.pool()).list_all(limit).await?;
    Ok(ApiJson(orders))
}

#[instrument(skip(state, _admin, body))]
async fn set_order_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<AdminStatusRequest>,
) -> Result<ApiJson<StatusChanged>> {
    let status = OrderEngine::new(state.pool())
        .admin_update_status(order_id, body.status)
        .await?;
    tracing::info!(order_id = %order_id, status = %status, "Order status set by admin");
    Ok(ApiJson(StatusChanged { order_id, status }))
}
