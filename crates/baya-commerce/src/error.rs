//! Commerce error types.

use serde::Serialize;
use thiserror::Error;

use crate::notice::{messages, Notice};

/// A single failing form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name (e.g. "email").
    pub field: &'static str,
    /// User-facing message.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors that can occur in cart, checkout and catalog operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Quantity below one.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Stock oracle or cached stock status refused the quantity.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
        message: Option<String>,
    },

    /// Operation needs a non-empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Checkout incomplete.
    #[error("Checkout incomplete: missing {0}")]
    CheckoutIncomplete(String),

    /// An order submission is already running.
    #[error("An order submission is already in flight")]
    SubmissionInFlight,

    /// One or more form fields failed validation.
    #[error("Form invalid: {}", .0.iter().map(|e| e.field).collect::<Vec<_>>().join(", "))]
    FormInvalid(Vec<FieldError>),

    /// Promo code refused by the server.
    #[error("Promo code rejected: {0}")]
    PromoRejected(String),

    /// Order refused by the server.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Payment provider refused or failed the payment.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// Transport-level failure talking to the REST API.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A back-office call failed; `message` is what the screen shows.
    #[error("{message}: {detail}")]
    AdminFailed { message: &'static str, detail: String },

    /// The admin resource does not support this operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Local storage error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl CommerceError {
    /// The user-facing notification for this error.
    pub fn notice(&self) -> Notice {
        match self {
            CommerceError::ItemNotInCart(_) => Notice::error(messages::ITEM_NOT_IN_CART),
            CommerceError::InvalidQuantity(_) => Notice::error(messages::INVALID_QUANTITY),
            CommerceError::QuantityExceedsLimit(_, max) => {
                Notice::warning(format!("La quantité maximale est de {}", max))
            }
            CommerceError::InsufficientStock {
                available, message, ..
            } => match message.as_deref().filter(|m| !m.trim().is_empty()) {
                Some(m) => Notice::warning(m),
                None if *available > 0 => Notice::warning(format!(
                    "La quantité demandée dépasse le stock disponible ({} disponibles)",
                    available
                )),
                None => Notice::warning(messages::STOCK_UNAVAILABLE),
            },
            CommerceError::EmptyCart => Notice::warning(messages::EMPTY_CART),
            CommerceError::InvalidCheckoutTransition { .. } => {
                Notice::warning(messages::INVALID_STEP)
            }
            CommerceError::CheckoutIncomplete(what) => {
                Notice::warning(format!("Informations manquantes : {}", what))
            }
            CommerceError::SubmissionInFlight => Notice::info(messages::SUBMISSION_IN_FLIGHT),
            CommerceError::FormInvalid(fields) => match fields.first() {
                Some(first) => Notice::error(first.message.clone()),
                None => Notice::error(messages::FORM_INVALID),
            },
            CommerceError::PromoRejected(m) => Notice::error(m.clone()),
            CommerceError::OrderRejected(m) => Notice::error(m.clone()),
            CommerceError::PaymentFailed(m) => Notice::error(m.clone()),
            CommerceError::Upstream(_) => Notice::error(messages::SERVER_UNREACHABLE),
            CommerceError::AdminFailed { message, .. } => Notice::error(*message),
            CommerceError::Unsupported(_) => Notice::error(messages::UNSUPPORTED),
            CommerceError::ValidationError(m) => Notice::warning(m.clone()),
            CommerceError::Overflow
            | CommerceError::StorageError(_)
            | CommerceError::SerializationError(_) => Notice::error(messages::UNEXPECTED),
        }
    }
}

impl From<baya_store::StoreError> for CommerceError {
    fn from(e: baya_store::StoreError) -> Self {
        CommerceError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
