//! Database operations for the catalog tree.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use ziva_core::{CategoryId, ProductId, SubCategoryId, slugify};

use super::RepositoryError;
use crate::models::{
    Category, CategoryTree, NewCategory, NewProduct, NewSubCategory, Product, ProductDetail,
    ProductFilter, ProductSummary, ProductUpdate, SubCategory, SubCategoryPage,
    SubCategoryWithProducts,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubCategoryRow {
    id: i32,
    category_id: i32,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubCategoryRow> for SubCategory {
    fn from(row: SubCategoryRow) -> Self {
        Self {
            id: SubCategoryId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    sub_category_id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    image_url: Option<String>,
    stock: i32,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            sub_category_id: SubCategoryId::new(row.sub_category_id),
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            stock: row.stock,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductSummaryRow {
    id: i32,
    sub_category_id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    image_url: Option<String>,
    stock: i32,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            sub_category_id: SubCategoryId::new(row.sub_category_id),
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            stock: row.stock,
        }
    }
}

/// Product joined with its sub-category (`sc_`) and category (`c_`).
#[derive(Debug, sqlx::FromRow)]
struct ProductDetailRow {
    #[sqlx(flatten)]
    product: ProductRow,
    sc_id: i32,
    sc_category_id: i32,
    sc_name: String,
    sc_description: Option<String>,
    sc_image_url: Option<String>,
    sc_created_at: DateTime<Utc>,
    sc_updated_at: DateTime<Utc>,
    c_id: i32,
    c_name: String,
    c_description: Option<String>,
    c_image_url: Option<String>,
    c_created_at: DateTime<Utc>,
    c_updated_at: DateTime<Utc>,
}

impl From<ProductDetailRow> for ProductDetail {
    fn from(row: ProductDetailRow) -> Self {
        Self {
            product: row.product.into(),
            sub_category: SubCategory {
                id: SubCategoryId::new(row.sc_id),
                category_id: CategoryId::new(row.sc_category_id),
                name: row.sc_name,
                description: row.sc_description,
                image_url: row.sc_image_url,
                created_at: row.sc_created_at,
                updated_at: row.sc_updated_at,
            },
            category: Category {
                id: CategoryId::new(row.c_id),
                name: row.c_name,
                description: row.c_description,
                image_url: row.c_image_url,
                created_at: row.c_created_at,
                updated_at: row.c_updated_at,
            },
        }
    }
}

// =============================================================================
// Tree assembly
// =============================================================================

/// Nest flat category, sub-category and product lists into trees.
///
/// Input order is preserved at every level. Sub-categories or products whose
/// parent is absent from the input are dropped.
pub(crate) fn assemble_tree(
    categories: Vec<Category>,
    sub_categories: Vec<SubCategory>,
    products: Vec<Product>,
) -> Vec<CategoryTree> {
    let mut products_by_sub: BTreeMap<SubCategoryId, Vec<Product>> = BTreeMap::new();
    for product in products {
        products_by_sub
            .entry(product.sub_category_id)
            .or_default()
            .push(product);
    }

    let mut subs_by_category: BTreeMap<CategoryId, Vec<SubCategoryWithProducts>> =
        BTreeMap::new();
    for sub_category in sub_categories {
        let products = products_by_sub
            .remove(&sub_category.id)
            .unwrap_or_default();
        subs_by_category
            .entry(sub_category.category_id)
            .or_default()
            .push(SubCategoryWithProducts {
                sub_category,
                products,
            });
    }

    categories
        .into_iter()
        .map(|category| CategoryTree {
            sub_categories: subs_by_category.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect()
}

/// Whether `name` is addressed by the URL segment `segment`.
///
/// Accepts either the slug form (`hand-tools`) or the raw name, ignoring case.
pub(crate) fn matches_segment(name: &str, segment: &str) -> bool {
    slugify(name) == segment.trim().to_lowercase() || name.eq_ignore_ascii_case(segment.trim())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// List all categories, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image_url, created_at, updated_at
            FROM shop.category
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List all sub-categories, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_sub_categories(&self) -> Result<Vec<SubCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubCategoryRow>(
            r"
            SELECT id, category_id, name, description, image_url, created_at, updated_at
            FROM shop.sub_category
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Load the whole catalog as category trees.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn category_trees(&self) -> Result<Vec<CategoryTree>, RepositoryError> {
        let categories = self.list_categories().await?;
        let sub_categories = self.list_sub_categories().await?;
        let products = self.list_products(&ProductFilter::default()).await?;

        Ok(assemble_tree(categories, sub_categories, products))
    }

    /// Find a category by slug or name and load its tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn find_category_tree(
        &self,
        segment: &str,
    ) -> Result<Option<CategoryTree>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image_url, created_at, updated_at
            FROM shop.category
            WHERE lower(regexp_replace(trim(name), '\s+', '-', 'g')) = lower(trim($1))
               OR lower(name) = lower(trim($1))
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(segment)
        .fetch_optional(self.pool)
        .await?;

        let Some(category) = row.map(Category::from) else {
            return Ok(None);
        };

        let sub_categories: Vec<SubCategory> = sqlx::query_as::<_, SubCategoryRow>(
            r"
            SELECT id, category_id, name, description, image_url, created_at, updated_at
            FROM shop.sub_category
            WHERE category_id = $1
            ORDER BY id
            ",
        )
        .bind(category.id.as_i32())
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        let sub_ids: Vec<i32> = sub_categories.iter().map(|s| s.id.as_i32()).collect();
        let products: Vec<Product> = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, sub_category_id, name, description, price, image_url, stock, tags,
                   created_at, updated_at
            FROM shop.product
            WHERE sub_category_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&sub_ids)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        Ok(assemble_tree(vec![category], sub_categories, products).pop())
    }

    /// Find a sub-category page by category and sub-category segments.
    ///
    /// When `tag` is given only products carrying it are listed; the parent
    /// category tree is always complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn find_sub_category_page(
        &self,
        category_segment: &str,
        sub_category_segment: &str,
        tag: Option<&str>,
    ) -> Result<Option<SubCategoryPage>, RepositoryError> {
        let Some(tree) = self.find_category_tree(category_segment).await? else {
            return Ok(None);
        };

        let Some(found) = tree
            .sub_categories
            .iter()
            .find(|s| matches_segment(&s.sub_category.name, sub_category_segment))
        else {
            return Ok(None);
        };

        let products = found
            .products
            .iter()
            .filter(|p| tag.is_none_or(|tag| p.tags.iter().any(|t| t == tag)))
            .cloned()
            .collect();
        let sub_category = found.sub_category.clone();

        Ok(Some(SubCategoryPage {
            sub_category,
            products,
            category: tree,
        }))
    }

    /// List products, optionally filtered by tag and sub-category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, sub_category_id, name, description, price, image_url, stock, tags,
                   created_at, updated_at
            FROM shop.product
            WHERE ($1::text IS NULL OR $1 = ANY(tags))
              AND ($2::int IS NULL OR sub_category_id = $2)
            ORDER BY id
            ",
        )
        .bind(filter.tag.as_deref())
        .bind(filter.sub_category_id.map(|id| id.as_i32()))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product with its sub-category and category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_product(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductDetailRow>(
            r"
            SELECT p.id, p.sub_category_id, p.name, p.description, p.price, p.image_url,
                   p.stock, p.tags, p.created_at, p.updated_at,
                   sc.id AS sc_id, sc.category_id AS sc_category_id, sc.name AS sc_name,
                   sc.description AS sc_description, sc.image_url AS sc_image_url,
                   sc.created_at AS sc_created_at, sc.updated_at AS sc_updated_at,
                   c.id AS c_id, c.name AS c_name, c.description AS c_description,
                   c.image_url AS c_image_url, c.created_at AS c_created_at,
                   c.updated_at AS c_updated_at
            FROM shop.product p
            JOIN shop.sub_category sc ON sc.id = p.sub_category_id
            JOIN shop.category c ON c.id = sc.category_id
            WHERE p.id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get the summary fields of a product (used for stock checks).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_summary(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductSummaryRow>(
            r"
            SELECT id, sub_category_id, name, description, price, image_url, stock
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    // =========================================================================
    // Admin writes
    // =========================================================================

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, input: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (name, description, image_url)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, image_url, created_at, updated_at
            ",
        )
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "category name already exists"))?;

        Ok(row.into())
    }

    /// Create a sub-category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist, or
    /// `RepositoryError::Conflict` if the name is taken within the category.
    #[instrument(skip(self, input), fields(category_id = %input.category_id, name = %input.name))]
    pub async fn create_sub_category(
        &self,
        input: &NewSubCategory,
    ) -> Result<SubCategory, RepositoryError> {
        let row = sqlx::query_as::<_, SubCategoryRow>(
            r"
            INSERT INTO shop.sub_category (category_id, name, description, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, category_id, name, description, image_url, created_at, updated_at
            ",
        )
        .bind(input.category_id.as_i32())
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_constraint(e, "sub-category name already exists in this category")
        })?;

        Ok(row.into())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the sub-category doesn't exist.
    #[instrument(skip(self, input), fields(sub_category_id = %input.sub_category_id, name = %input.name))]
    pub async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO shop.product
                (sub_category_id, name, description, price, image_url, stock, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sub_category_id, name, description, price, image_url, stock, tags,
                      created_at, updated_at
            ",
        )
        .bind(input.sub_category_id.as_i32())
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.image_url.as_deref())
        .bind(input.stock)
        .bind(&input.tags)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product already exists"))?;

        Ok(row.into())
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product (or a new
    /// sub-category) doesn't exist.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE shop.product
            SET sub_category_id = COALESCE($2, sub_category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                image_url = COALESCE($6, image_url),
                stock = COALESCE($7, stock),
                tags = COALESCE($8, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, sub_category_id, name, description, price, image_url, stock, tags,
                      created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(update.sub_category_id.map(|id| id.as_i32()))
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.image_url.as_deref())
        .bind(update.stock)
        .bind(update.tags.clone())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// Orphaned cart and wishlist lines are left behind and filtered on read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist, or
    /// `RepositoryError::Conflict` if it appears on an order.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    RepositoryError::Conflict(
                        "product has order history and cannot be deleted".to_string(),
                    )
                }
                other => RepositoryError::Database(other),
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every category, sub-category and product in one transaction.
    ///
    /// Returns the number of products removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any product appears on an order.
    #[instrument(skip(self))]
    pub async fn clear_catalog(&self) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM shop.product")
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    RepositoryError::Conflict(
                        "catalog has order history and cannot be cleared".to_string(),
                    )
                }
                other => RepositoryError::Database(other),
            })?
            .rows_affected();
        sqlx::query("DELETE FROM shop.sub_category")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shop.category")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sub_category(id: i32, category_id: i32, name: &str) -> SubCategory {
        SubCategory {
            id: SubCategoryId::new(id),
            category_id: CategoryId::new(category_id),
            name: name.to_string(),
            description: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: i32, sub_category_id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            sub_category_id: SubCategoryId::new(sub_category_id),
            name: format!("Product {id}"),
            description: None,
            price: Decimal::new(500, 2),
            image_url: None,
            stock: 1,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_tree_nests_in_order() {
        let trees = assemble_tree(
            vec![category(1, "Tools"), category(2, "Plants")],
            vec![
                sub_category(10, 1, "Hand Tools"),
                sub_category(11, 2, "Shrubs"),
                sub_category(12, 1, "Power Tools"),
            ],
            vec![product(100, 10), product(101, 12), product(102, 10)],
        );

        assert_eq!(trees.len(), 2);
        let tools = &trees[0];
        assert_eq!(tools.category.name, "Tools");
        assert_eq!(tools.sub_categories.len(), 2);
        assert_eq!(tools.sub_categories[0].sub_category.name, "Hand Tools");
        let ids: Vec<i32> = tools.sub_categories[0]
            .products
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![100, 102]);
        assert_eq!(tools.sub_categories[1].products.len(), 1);

        assert_eq!(trees[1].sub_categories.len(), 1);
        assert!(trees[1].sub_categories[0].products.is_empty());
    }

    #[test]
    fn test_assemble_tree_drops_orphans() {
        let trees = assemble_tree(
            vec![category(1, "Tools")],
            vec![sub_category(10, 99, "Elsewhere")],
            vec![product(100, 77)],
        );
        assert_eq!(trees.len(), 1);
        assert!(trees[0].sub_categories.is_empty());
    }

    #[test]
    fn test_matches_segment() {
        assert!(matches_segment("Hand Tools", "hand-tools"));
        assert!(matches_segment("Hand Tools", "HAND-TOOLS"));
        assert!(matches_segment("Hand Tools", "hand tools"));
        assert!(!matches_segment("Hand Tools", "power-tools"));
    }
}
