//! Product catalog module.
//!
//! Contains the back-office entities (products, categories, promo codes,
//! orders) with their form rules, and storefront filtering.

mod category;
mod order;
mod product;
mod promo;
mod query;

pub use category::Category;
pub use order::{Order, OrderStatus};
pub use product::Product;
pub use promo::PromoCode;
pub use query::{CatalogQuery, SortOption};
