//! Delivery method types.

use serde::{Deserialize, Serialize};

use crate::ids::DeliveryMethodId;
use crate::money::Money;

/// Whether the Delivery step may be left without a selected method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryRequirement {
    /// Advance anyway and warn.
    #[default]
    Advisory,
    /// Block until a method is selected.
    Required,
}

/// A delivery option offered at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryMethod {
    pub id: DeliveryMethodId,
    /// Display name.
    pub name: String,
    #[serde(with = "crate::wire::decimal_money")]
    pub price: Money,
    pub estimated_days: u32,
}

impl DeliveryMethod {
    pub fn new(
        id: impl Into<DeliveryMethodId>,
        name: impl Into<String>,
        price: Money,
        estimated_days: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            estimated_days,
        }
    }

    /// The methods offered when none are configured.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("standard", "Livraison standard", Money::eur(0.0), 2),
            Self::new("express", "Livraison express", Money::eur(9.9), 1),
        ]
    }

    /// Get delivery estimate string.
    pub fn delivery_estimate(&self) -> String {
        match self.estimated_days {
            0 => "Livraison le jour même".to_string(),
            1 => "Livraison en 1 jour".to_string(),
            n => format!("Livraison en {n} jours"),
        }
    }

    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let methods = DeliveryMethod::defaults();
        assert_eq!(methods.len(), 2);
        assert!(methods[0].is_free());
        assert_eq!(methods[1].price.amount_cents, 990);
        assert_eq!(methods[1].delivery_estimate(), "Livraison en 1 jour");
    }

    #[test]
    fn test_wire_shape_uses_decimal_price() {
        let json = serde_json::to_value(&DeliveryMethod::defaults()[1]).unwrap();
        assert_eq!(json["id"], "express");
        assert_eq!(json["price"], 9.9);
        assert_eq!(json["estimatedDays"], 1);
    }

    #[test]
    fn test_requirement_from_config_string() {
        let r: DeliveryRequirement = serde_json::from_str("\"required\"").unwrap();
        assert_eq!(r, DeliveryRequirement::Required);
        assert_eq!(DeliveryRequirement::default(), DeliveryRequirement::Advisory);
    }
}
