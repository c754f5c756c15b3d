//! Product listing and detail.

use axum::extract::State;
use tracing::instrument;

use ziva_core::ProductId;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::models::{Product, ProductDetail, ProductFilter};
use crate::state::AppState;

/// List products, filtered by `?tag=` and `?subCategoryId=`.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<ApiJson<Vec<Product>>> {
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(ApiJson(products))
}

/// A product with its sub-category and category.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<ApiJson<ProductDetail>> {
    CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .map(ApiJson)
        .ok_or_else(|| AppError::NotFound(format!("Product not found: ID {id}")))
}
