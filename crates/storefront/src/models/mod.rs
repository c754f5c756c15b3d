//! Domain models for the storefront.
//!
//! These are the shapes returned by the repositories and serialized by the
//! JSON API. Database row types stay private to `crate::db`.

pub mod cart;
pub mod catalog;
pub mod navigation;
pub mod order;

pub use cart::{CartLine, WishlistEntry};
pub use catalog::{
    Category, CategoryTree, NewCategory, NewProduct, NewSubCategory, Product, ProductDetail,
    ProductFilter, ProductSummary, ProductUpdate, SubCategory, SubCategoryPage,
    SubCategoryWithProducts,
};
pub use navigation::{NavCategory, NavFeatured, NavItem, NavSection};
pub use order::{Order, OrderCreated, OrderItem};
