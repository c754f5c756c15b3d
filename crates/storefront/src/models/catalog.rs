//! Catalog domain models: categories, sub-categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ziva_core::{CategoryId, ProductId, SubCategoryId, slugify};

/// A top-level catalog grouping (e.g. "Garden Tools").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// URL slug derived from the display name.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// A grouping of products within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: SubCategoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubCategory {
    /// URL slug derived from the display name.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub sub_category_id: SubCategoryId,
    pub name: String,
    pub description: Option<String>,
    /// Unit price, two decimal places.
    pub price: Decimal,
    pub image_url: Option<String>,
    /// Units available. Never negative.
    pub stock: i32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The subset of product fields embedded in cart lines, wishlist entries and
/// order items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub sub_category_id: SubCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            sub_category_id: product.sub_category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            stock: product.stock,
        }
    }
}

/// A sub-category with its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryWithProducts {
    #[serde(flatten)]
    pub sub_category: SubCategory,
    pub products: Vec<Product>,
}

/// A category with its sub-categories, each carrying its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub sub_categories: Vec<SubCategoryWithProducts>,
}

/// A sub-category page: its (optionally tag-filtered) products plus the
/// parent category tree for sibling navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryPage {
    #[serde(flatten)]
    pub sub_category: SubCategory,
    pub products: Vec<Product>,
    pub category: CategoryTree,
}

/// A product with its sub-category and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub sub_category: SubCategory,
    pub category: Category,
}

/// Product listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Only products carrying this tag.
    pub tag: Option<String>,
    /// Only products in this sub-category.
    pub sub_category_id: Option<SubCategoryId>,
}

// =============================================================================
// Admin inputs
// =============================================================================

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Input for creating a sub-category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSubCategory {
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProduct {
    pub sub_category_id: SubCategoryId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductUpdate {
    pub sub_category_id: Option<SubCategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
    pub tags: Option<Vec<String>>,
}

/// Reject blank names and negative or over-precise prices and stock.
///
/// Shared by the create and update paths so both enforce the same column
/// constraints before hitting the database.
pub(crate) fn check_product_fields(
    name: Option<&str>,
    price: Option<Decimal>,
    stock: Option<i32>,
) -> Result<(), String> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err("name cannot be empty".to_string());
    }
    if let Some(price) = price {
        if price < Decimal::ZERO {
            return Err("price cannot be negative".to_string());
        }
        if price.scale() > 2 {
            return Err("price must have at most two decimal places".to_string());
        }
    }
    if stock.is_some_and(|s| s < 0) {
        return Err("stock cannot be negative".to_string());
    }
    Ok(())
}

impl NewProduct {
    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        check_product_fields(Some(&self.name), Some(self.price), Some(self.stock))
    }
}

impl ProductUpdate {
    /// Check field constraints on the fields being changed.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        check_product_fields(self.name.as_deref(), self.price, self.stock)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(7),
            sub_category_id: SubCategoryId::new(2),
            name: "Pruning Shears".to_string(),
            description: None,
            price: Decimal::new(1999, 2),
            image_url: Some("https://cdn.example/shears.jpg".to_string()),
            stock: 4,
            tags: vec!["new-arrivals".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_value(product()).unwrap();
        assert_eq!(json["subCategoryId"], 2);
        assert_eq!(json["imageUrl"], "https://cdn.example/shears.jpg");
        assert_eq!(json["price"], "19.99");
    }

    #[test]
    fn test_summary_drops_tags() {
        let summary = ProductSummary::from(product());
        let json = serde_json::to_value(summary).unwrap();
        assert!(json.get("tags").is_none());
        assert_eq!(json["stock"], 4);
    }

    #[test]
    fn test_new_product_validation() {
        let mut input = NewProduct {
            sub_category_id: SubCategoryId::new(1),
            name: "Hose".to_string(),
            description: None,
            price: Decimal::new(1050, 2),
            image_url: None,
            stock: 3,
            tags: vec![],
        };
        assert!(input.validate().is_ok());

        input.price = Decimal::new(-1, 0);
        assert_eq!(input.validate().unwrap_err(), "price cannot be negative");

        input.price = Decimal::new(10_001, 3);
        assert!(input.validate().is_err());

        input.price = Decimal::ONE;
        input.stock = -1;
        assert_eq!(input.validate().unwrap_err(), "stock cannot be negative");
    }

    #[test]
    fn test_update_only_checks_present_fields() {
        assert!(ProductUpdate::default().validate().is_ok());
        let update = ProductUpdate {
            name: Some("  ".to_string()),
            ..ProductUpdate::default()
        };
        assert_eq!(update.validate().unwrap_err(), "name cannot be empty");
    }

    #[test]
    fn test_new_product_rejects_unknown_fields() {
        let result = serde_json::from_str::<NewProduct>(
            r#"{"subCategoryId":1,"name":"Rake","price":"5.00","colour":"red"}"#,
        );
        assert!(result.is_err());
    }
}
