//! Storefront navigation menu built from the category tree.

use serde::{Deserialize, Serialize};

use super::catalog::CategoryTree;

const FEATURED_IMAGE_NEW: &str =
    "https://tailwindcss.com/plus-assets/img/ecommerce-images/mega-menu-category-01.jpg";
const FEATURED_IMAGE_POPULAR: &str =
    "https://tailwindcss.com/plus-assets/img/ecommerce-images/mega-menu-category-02.jpg";

/// A highlighted tile shown at the top of a category menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavFeatured {
    pub name: String,
    pub href: String,
    pub image_src: String,
    pub image_alt: String,
}

/// A link inside a menu section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub name: String,
    pub href: String,
}

/// A menu column listing sub-category links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSection {
    pub id: String,
    pub name: String,
    pub items: Vec<NavItem>,
}

/// One top-level entry of the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavCategory {
    pub id: String,
    pub name: String,
    pub featured: Vec<NavFeatured>,
    pub sections: Vec<NavSection>,
}

impl From<&CategoryTree> for NavCategory {
    fn from(tree: &CategoryTree) -> Self {
        let category = &tree.category;
        let base = format!("/shop/{}", category.slug());
        let image = |fallback: &str| {
            category
                .image_url
                .clone()
                .unwrap_or_else(|| fallback.to_string())
        };

        let featured = vec![
            NavFeatured {
                name: "New Arrivals".to_string(),
                href: base.clone(),
                image_src: image(FEATURED_IMAGE_NEW),
                image_alt: format!("Featured {}", category.name),
            },
            NavFeatured {
                name: "Popular Items".to_string(),
                href: base.clone(),
                image_src: image(FEATURED_IMAGE_POPULAR),
                image_alt: format!("Popular {} items", category.name),
            },
        ];

        let items = tree
            .sub_categories
            .iter()
            .map(|sub| NavItem {
                name: sub.sub_category.name.clone(),
                href: format!("{base}/{}", sub.sub_category.slug()),
            })
            .collect();

        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            featured,
            sections: vec![NavSection {
                id: category.id.to_string(),
                name: category.name.clone(),
                items,
            }],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use ziva_core::{CategoryId, SubCategoryId};

    use super::*;
    use crate::models::catalog::{Category, SubCategory, SubCategoryWithProducts};

    fn tree() -> CategoryTree {
        let now = Utc::now();
        CategoryTree {
            category: Category {
                id: CategoryId::new(1),
                name: "Garden Tools".to_string(),
                description: None,
                image_url: None,
                created_at: now,
                updated_at: now,
            },
            sub_categories: vec![SubCategoryWithProducts {
                sub_category: SubCategory {
                    id: SubCategoryId::new(3),
                    category_id: CategoryId::new(1),
                    name: "Hand Tools".to_string(),
                    description: None,
                    image_url: None,
                    created_at: now,
                    updated_at: now,
                },
                products: vec![],
            }],
        }
    }

    #[test]
    fn test_nav_hrefs_use_slugs() {
        let nav = NavCategory::from(&tree());
        assert_eq!(nav.id, "1");
        assert_eq!(nav.sections.len(), 1);
        assert_eq!(nav.sections[0].items[0].name, "Hand Tools");
        assert_eq!(nav.sections[0].items[0].href, "/shop/garden-tools/hand-tools");
        assert_eq!(nav.featured[0].href, "/shop/garden-tools");
    }

    #[test]
    fn test_featured_falls_back_to_default_images() {
        let nav = NavCategory::from(&tree());
        assert_eq!(nav.featured.len(), 2);
        assert_eq!(nav.featured[0].image_src, FEATURED_IMAGE_NEW);
        assert_eq!(nav.featured[1].image_src, FEATURED_IMAGE_POPULAR);
        assert_eq!(nav.featured[0].image_alt, "Featured Garden Tools");

        let json = serde_json::to_value(&nav).unwrap();
        assert!(json["featured"][0].get("imageSrc").is_some());
    }
}
