//! Shopping cart module.
//!
//! Contains the persisted cart store, stock status and promo discounts.

mod discount;
mod stock;
mod store;

pub use discount::{
    apply_promo_code, compute_discount, DiscountRecord, DiscountRetention, PromoValidation,
    PromoValidator,
};
pub use stock::{StockOracle, StockStatus};
pub use store::{
    CartProduct, CartSnapshot, CartState, CartStore, LineItem, CART_KEY, MAX_QUANTITY_PER_ITEM,
    SNAPSHOT_VERSION,
};
