//! Promo-code discounts.

use async_trait::async_trait;
use baya_store::KvStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::CartStore;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Money;
use crate::notice::messages;

/// What happens to an active discount when a line item is removed.
///
/// The discount was validated against the product ids present at the time,
/// so removing one of them can be treated either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRetention {
    /// Keep the percentage and re-apply it to the new subtotal.
    #[default]
    Retain,
    /// Drop the discount; the shopper has to validate the code again.
    InvalidateOnRemoval,
}

/// The single active discount on a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRecord {
    /// Percentage off, 0..=100.
    pub percentage: f64,
    /// Amount currently taken off the cart subtotal.
    pub amount: Money,
    /// Cart subtotal when the discount was applied.
    pub original_total: Money,
    /// Promo code the discount came from, if any.
    #[serde(default)]
    pub code: Option<String>,
}

impl DiscountRecord {
    /// Build a record for `percentage` off `original_total`.
    pub fn new(percentage: f64, original_total: Money) -> Self {
        let percentage = clamp_percentage(percentage);
        let (_, amount) = compute_discount(original_total, percentage);
        Self {
            percentage,
            amount,
            original_total,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

fn clamp_percentage(percentage: f64) -> f64 {
    if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    }
}

/// Apply `percentage` to `original_total`.
///
/// Returns `(discounted_total, discount_amount)`; the two always add up to
/// `original_total`.
///
/// ```
/// use baya_commerce::cart::compute_discount;
/// use baya_commerce::Money;
///
/// let (total, amount) = compute_discount(Money::eur(40.0), 10.0);
/// assert_eq!(total, Money::eur(36.0));
/// assert_eq!(amount, Money::eur(4.0));
/// ```
pub fn compute_discount(original_total: Money, percentage: f64) -> (Money, Money) {
    let amount = original_total.percentage(clamp_percentage(percentage));
    let total = Money::new(
        original_total.amount_cents - amount.amount_cents,
        original_total.currency,
    );
    (total, amount)
}

/// Server answer to a promo-code validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoValidation {
    pub valid: bool,
    /// Percentage off.
    #[serde(default)]
    pub reduction: f64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validates promo codes against the products in the cart.
#[async_trait]
pub trait PromoValidator: Send + Sync {
    async fn validate(
        &self,
        code: &str,
        product_ids: &[ProductId],
    ) -> Result<PromoValidation, CommerceError>;
}

/// Validate `code` once and install the resulting discount.
///
/// Any failure leaves the cart untouched. A successful validation replaces
/// whatever discount was active.
pub async fn apply_promo_code<S: KvStore>(
    store: &mut CartStore<S>,
    validator: &dyn PromoValidator,
    code: &str,
) -> Result<DiscountRecord, CommerceError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CommerceError::ValidationError(messages::PROMO_MISSING.to_string()));
    }
    if store.is_empty() {
        return Err(CommerceError::EmptyCart);
    }

    let product_ids: Vec<ProductId> = store.items().iter().map(|i| i.id.clone()).collect();
    debug!(code, products = product_ids.len(), "validating promo code");

    let validation = validator.validate(code, &product_ids).await?;
    if !validation.valid {
        let message = validation
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| messages::PROMO_INVALID.to_string());
        return Err(CommerceError::PromoRejected(message));
    }

    let record = DiscountRecord::new(validation.reduction, store.original_total()).with_code(code);
    store.apply_discount(record.clone())?;
    info!(code, percentage = record.percentage, "promo code applied");
    Ok(record)
}
