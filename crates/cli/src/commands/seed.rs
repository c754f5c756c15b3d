//! Seed the catalog from a YAML file.
//!
//! The file nests sub-categories under categories and products under
//! sub-categories:
//!
//! ```yaml
//! categories:
//!   - name: Plants
//!     subCategories:
//!       - name: Shrubs
//!         products:
//!           - name: Bougainvillea
//!             price: "850.00"
//!             stock: 40
//!             tags: [flowering]
//! ```
//!
//! Seeding is additive: categories and sub-categories are matched by name
//! and reused, and products already present in their sub-category (by name)
//! are skipped. `--clear` deletes the existing catalog first.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info, warn};

use ziva_core::{CategoryId, SubCategoryId, slugify};
use ziva_storefront::db::{self, CatalogRepository};
use ziva_storefront::models::{NewCategory, NewProduct, NewSubCategory, ProductFilter};

/// Root of the catalog YAML file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sub_categories: Vec<SubCategorySeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubCategorySeed {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProductSeed {
    fn to_new_product(&self, sub_category_id: SubCategoryId) -> NewProduct {
        NewProduct {
            sub_category_id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
            stock: self.stock,
            tags: self.tags.clone(),
        }
    }
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub sub_categories: usize,
    pub products: usize,
    pub skipped: usize,
}

/// Check a parsed file for problems the database would reject, plus
/// duplicate names that would collide on URL slugs.
///
/// Returns one message per problem.
pub fn validate_seed(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut category_slugs = HashSet::new();

    for category in &seed.categories {
        if category.name.trim().is_empty() {
            errors.push("category with empty name".to_string());
            continue;
        }
        if !category_slugs.insert(slugify(&category.name)) {
            errors.push(format!("duplicate category: {}", category.name));
        }

        let mut sub_slugs = HashSet::new();
        for sub in &category.sub_categories {
            if sub.name.trim().is_empty() {
                errors.push(format!("{}: sub-category with empty name", category.name));
                continue;
            }
            if !sub_slugs.insert(slugify(&sub.name)) {
                errors.push(format!(
                    "{}: duplicate sub-category: {}",
                    category.name, sub.name
                ));
            }

            for product in &sub.products {
                // Field checks don't look at the sub-category id.
                if let Err(e) = product.to_new_product(SubCategoryId::new(0)).validate() {
                    errors.push(format!(
                        "{} / {} / {}: {e}",
                        category.name, sub.name, product.name
                    ));
                }
            }
        }
    }

    errors
}

/// Seed the catalog from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML catalog file
/// * `clear_existing` - If true, delete the existing catalog first
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file can't be read
/// or fails validation, or a database operation fails.
pub async fn catalog(file_path: &str, clear_existing: bool) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url().ok_or("STOREFRONT_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    info!(categories = seed.categories.len(), "Parsed catalog");

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let catalog = CatalogRepository::new(&pool);

    if clear_existing {
        let removed = catalog.clear_catalog().await?;
        info!(products_removed = removed, "Cleared existing catalog");
    }

    let summary = apply(&catalog, &seed).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories);
    info!("  Sub-categories created: {}", summary.sub_categories);
    info!("  Products created: {}", summary.products);
    info!("  Products skipped (already exist): {}", summary.skipped);

    Ok(())
}

async fn apply(
    catalog: &CatalogRepository<'_>,
    seed: &CatalogSeed,
) -> Result<SeedSummary, db::RepositoryError> {
    let mut summary = SeedSummary::default();
    let existing_categories = catalog.list_categories().await?;
    let existing_subs = catalog.list_sub_categories().await?;

    for category_seed in &seed.categories {
        let category_id = if let Some(found) = existing_categories
            .iter()
            .find(|c| slugify(&c.name) == slugify(&category_seed.name))
        {
            found.id
        } else {
            let created = catalog
                .create_category(&NewCategory {
                    name: category_seed.name.clone(),
                    description: category_seed.description.clone(),
                    image_url: category_seed.image_url.clone(),
                })
                .await?;
            summary.categories += 1;
            created.id
        };

        for sub_seed in &category_seed.sub_categories {
            let sub_category_id =
                find_or_create_sub(catalog, &existing_subs, category_id, sub_seed, &mut summary)
                    .await?;

            let existing_products: HashSet<String> = catalog
                .list_products(&ProductFilter {
                    tag: None,
                    sub_category_id: Some(sub_category_id),
                })
                .await?
                .into_iter()
                .map(|p| p.name.to_lowercase())
                .collect();

            for product_seed in &sub_seed.products {
                if existing_products.contains(&product_seed.name.trim().to_lowercase()) {
                    warn!(product = %product_seed.name, "Product already exists, skipping");
                    summary.skipped += 1;
                    continue;
                }
                catalog
                    .create_product(&product_seed.to_new_product(sub_category_id))
                    .await?;
                summary.products += 1;
            }
        }
    }

    Ok(summary)
}

async fn find_or_create_sub(
    catalog: &CatalogRepository<'_>,
    existing: &[ziva_storefront::models::SubCategory],
    category_id: CategoryId,
    seed: &SubCategorySeed,
    summary: &mut SeedSummary,
) -> Result<SubCategoryId, db::RepositoryError> {
    if let Some(found) = existing
        .iter()
        .find(|s| s.category_id == category_id && slugify(&s.name) == slugify(&seed.name))
    {
        return Ok(found.id);
    }

    let created = catalog
        .create_sub_category(&NewSubCategory {
            category_id,
            name: seed.name.clone(),
            description: seed.description.clone(),
            image_url: seed.image_url.clone(),
        })
        .await?;
    summary.sub_categories += 1;
    Ok(created.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let seed: CatalogSeed =
            serde_yaml::from_str(include_str!("../../../../data/catalog.yaml")).unwrap();
        assert!(!seed.categories.is_empty());
        assert_eq!(validate_seed(&seed), Vec::<String>::new());
    }

    #[test]
    fn test_reports_bad_products_and_duplicates() {
        let yaml = r#"
categories:
  - name: Garden Care
    subCategories:
      - name: Tools
        products:
          - name: Rake
            price: "-1.00"
      - name: tools
  - name: garden care
"#;
        let seed: CatalogSeed = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_seed(&seed);

        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("price cannot be negative")));
        assert!(errors.iter().any(|e| e.contains("duplicate sub-category")));
        assert!(errors.iter().any(|e| e.contains("duplicate category")));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let yaml = "categories:\n  - name: Plants\n    colour: green\n";
        assert!(serde_yaml::from_str::<CatalogSeed>(yaml).is_err());
    }
}
