//! Category navigation and category pages.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::models::{CategoryTree, NavCategory, SubCategoryPage};
use crate::state::AppState;

/// `?tag=` filter for sub-category pages.
#[derive(Debug, Default, Deserialize)]
pub struct TagQuery {
    pub tag: Option<String>,
}

/// Navigation menu: every category with featured links and its
/// sub-categories.
#[instrument(skip(state))]
pub async fn navigation(State(state): State<AppState>) -> Result<ApiJson<Vec<NavCategory>>> {
    let trees = CatalogRepository::new(state.pool()).category_trees().await?;
    Ok(ApiJson(trees.iter().map(NavCategory::from).collect()))
}

/// A category with its sub-categories and their products.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<String>,
) -> Result<ApiJson<CategoryTree>> {
    CatalogRepository::new(state.pool())
        .find_category_tree(&category)
        .await?
        .map(ApiJson)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// A sub-category's products (optionally tag-filtered) plus its parent
/// category.
#[instrument(skip(state))]
pub async fn sub_category(
    State(state): State<AppState>,
    ApiPath((category, sub_category)): ApiPath<(String, String)>,
    ApiQuery(query): ApiQuery<TagQuery>,
) -> Result<ApiJson<SubCategoryPage>> {
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());

    CatalogRepository::new(state.pool())
        .find_sub_category_page(&category, &sub_category, tag)
        .await?
        .map(ApiJson)
        .ok_or_else(|| AppError::NotFound("Subcategory not found".to_string()))
}
