//! Storefront domain types and logic for BAYA SHOP.
//!
//! This crate holds everything the storefront and its back-office decide
//! locally:
//!
//! - **Cart**: persisted cart store, stock status cache, promo discounts
//! - **Checkout**: four-step wizard, customer form, delivery, order payload
//! - **Catalog**: products, categories, promo codes and orders with their form rules
//! - **Notices**: the French messages shown for every outcome
//!
//! Anything that needs the REST API goes through a trait
//! ([`cart::StockOracle`], [`cart::PromoValidator`], [`checkout::OrderGateway`],
//! [`checkout::PaymentProvider`]) so the logic can be driven by fakes.
//!
//! # Example
//!
//! ```
//! use baya_commerce::prelude::*;
//! use baya_store::MemoryStore;
//!
//! let mut cart = CartStore::load(MemoryStore::new());
//! cart.add_item(CartProduct::new("A1", "Dattes", Money::eur(20.0), "/a1.png"), 2)?;
//! cart.apply_discount(DiscountRecord::new(10.0, cart.original_total()))?;
//!
//! assert_eq!(cart.total(), Money::eur(36.0));
//! # Ok::<(), CommerceError>(())
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod notice;
pub mod wire;

pub mod cart;
pub mod catalog;
pub mod checkout;

pub use error::{CommerceError, FieldError};
pub use ids::*;
pub use money::{Currency, Money};
pub use notice::{Notice, NoticeBoard, NoticeLevel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CommerceError, FieldError};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::notice::{messages, Notice, NoticeBoard, NoticeLevel};

    // Cart
    pub use crate::cart::{
        apply_promo_code, compute_discount, CartProduct, CartState, CartStore, DiscountRecord,
        DiscountRetention, LineItem, PromoValidation, PromoValidator, StockOracle, StockStatus,
    };

    // Checkout
    pub use crate::checkout::{
        CheckoutSession, CheckoutStep, CheckoutWizard, CloseRequest, CustomerForm,
        DeliveryMethod, DeliveryRequirement, OrderGateway, OrderReceipt, OrderResponse,
        OrderSubmission, PaymentConfirmation, PaymentMethod, PaymentProvider,
    };

    // Catalog
    pub use crate::catalog::{
        CatalogQuery, Category, Order, OrderStatus, Product, PromoCode, SortOption,
    };
}
