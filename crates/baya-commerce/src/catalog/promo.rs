//! Promo codes managed from the back-office.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CommerceError, FieldError};
use crate::ids::{CategoryId, ProductId, PromoCodeId};
use crate::wire::{loose_bool, loose_f64, opt_date};

fn active_by_default() -> bool {
    true
}

/// A percentage promo code.
///
/// Empty `product_ids` and `category_ids` mean the code applies to the whole
/// catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoCode {
    #[serde(rename = "ID_PROMO", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PromoCodeId>,
    #[serde(rename = "Code")]
    pub code: String,
    /// Percentage off, 1..=100.
    #[serde(rename = "Reduction", with = "loose_f64")]
    pub reduction: f64,
    #[serde(rename = "DateDebut", with = "opt_date", default)]
    pub starts_on: Option<NaiveDate>,
    #[serde(rename = "DateFin", with = "opt_date", default)]
    pub ends_on: Option<NaiveDate>,
    #[serde(rename = "Active", with = "loose_bool", default = "active_by_default")]
    pub active: bool,
    #[serde(rename = "ProductIds", default)]
    pub product_ids: Vec<ProductId>,
    #[serde(rename = "CategoryIds", default)]
    pub category_ids: Vec<CategoryId>,
}

impl PromoCode {
    pub fn new(code: impl Into<String>, reduction: f64, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        Self {
            id: None,
            code: code.into(),
            reduction,
            starts_on: Some(starts_on),
            ends_on: Some(ends_on),
            active: true,
            product_ids: Vec::new(),
            category_ids: Vec::new(),
        }
    }

    /// Whether the code is active and `day` falls within its dates.
    pub fn is_valid_on(&self, day: NaiveDate) -> bool {
        self.active
            && self.starts_on.map_or(true, |start| start <= day)
            && self.ends_on.map_or(true, |end| day <= end)
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.code.trim().is_empty() {
            errors.push(FieldError::new("Code", "Code promo requis"));
        }
        if !(1.0..=100.0).contains(&self.reduction) {
            errors.push(FieldError::new(
                "Reduction",
                "La réduction doit être comprise entre 1 et 100",
            ));
        }
        if self.starts_on.is_none() {
            errors.push(FieldError::new("DateDebut", "Date de début requise"));
        }
        match (self.starts_on, self.ends_on) {
            (_, None) => errors.push(FieldError::new("DateFin", "Date de fin requise")),
            (Some(start), Some(end)) if end <= start => errors.push(FieldError::new(
                "DateFin",
                "La date de fin doit être après la date de début",
            )),
            _ => {}
        }
        errors
    }

    pub fn validate(&self) -> Result<(), CommerceError> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CommerceError::FormInvalid(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_wire_shape() {
        let promo = PromoCode::new("ETE", 15.0, day(2024, 6, 1), day(2024, 8, 31));
        let json = serde_json::to_value(&promo).unwrap();
        assert_eq!(json["DateDebut"], "2024-06-01");
        assert_eq!(json["DateFin"], "2024-08-31");
        assert_eq!(json["Reduction"], 15.0);
        assert_eq!(json["ProductIds"], serde_json::json!([]));

        let back: PromoCode = serde_json::from_value(json).unwrap();
        assert_eq!(back, promo);
    }

    #[test]
    fn test_end_must_follow_start() {
        let promo = PromoCode::new("ETE", 15.0, day(2024, 6, 1), day(2024, 6, 1));
        let errors = promo.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "La date de fin doit être après la date de début");
    }

    #[test]
    fn test_reduction_range_and_required_fields() {
        let mut promo = PromoCode::new("", 0.0, day(2024, 6, 1), day(2024, 7, 1));
        promo.starts_on = None;
        promo.ends_on = None;
        let fields: Vec<_> = promo.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["Code", "Reduction", "DateDebut", "DateFin"]);

        promo.reduction = 100.0;
        promo.code = "TOUT".to_string();
        promo.starts_on = Some(day(2024, 6, 1));
        promo.ends_on = Some(day(2024, 7, 1));
        assert!(promo.validate().is_ok());
    }

    #[test]
    fn test_is_valid_on() {
        let mut promo = PromoCode::new("ETE", 15.0, day(2024, 6, 1), day(2024, 8, 31));
        assert!(promo.is_valid_on(day(2024, 7, 14)));
        assert!(!promo.is_valid_on(day(2024, 9, 1)));
        promo.active = false;
        assert!(!promo.is_valid_on(day(2024, 7, 14)));
    }
}
