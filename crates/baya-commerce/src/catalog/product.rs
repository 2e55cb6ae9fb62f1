//! Product type as served by `/articles`.

use serde::{Deserialize, Serialize};

use crate::cart::CartProduct;
use crate::error::{CommerceError, FieldError};
use crate::ids::{CategoryId, ProductId};
use crate::money::Money;
use crate::wire::{decimal_money, decimal_money_opt, loose_bool, loose_u32};

fn visible_by_default() -> bool {
    true
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unset for products not yet created.
    #[serde(rename = "ID_ART", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[serde(rename = "Nom")]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    /// Current selling price.
    #[serde(rename = "Prix", with = "decimal_money")]
    pub price: Money,
    /// Price before the promotion, shown struck through.
    #[serde(rename = "AncienPrix", with = "decimal_money_opt", default)]
    pub old_price: Option<Money>,
    #[serde(rename = "Promotion", with = "loose_bool", default)]
    pub promotion: bool,
    #[serde(rename = "Visible", with = "loose_bool", default = "visible_by_default")]
    pub visible: bool,
    /// Units in stock.
    #[serde(rename = "Quantite", with = "loose_u32", default)]
    pub stock: u32,
    #[serde(rename = "ID_CAT", default)]
    pub category_id: Option<CategoryId>,
    /// Image path relative to the API base URL.
    #[serde(rename = "Photo", default)]
    pub photo: Option<String>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Money, category_id: impl Into<CategoryId>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            price,
            old_price: None,
            promotion: false,
            visible: true,
            stock: 0,
            category_id: Some(category_id.into()),
            photo: None,
        }
    }

    /// Put the product on promotion from `old_price`.
    pub fn on_promotion(mut self, old_price: Money) -> Self {
        self.promotion = true;
        self.old_price = Some(old_price);
        self
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Percentage saved against the old price, rounded.
    ///
    /// `None` unless the product is on promotion with a higher old price.
    pub fn discount_percent(&self) -> Option<u32> {
        let old = self.old_price.filter(|_| self.promotion)?;
        if old.amount_cents <= 0 || old.amount_cents <= self.price.amount_cents {
            return None;
        }
        let saved = (old.amount_cents - self.price.amount_cents) as f64;
        Some((saved / old.amount_cents as f64 * 100.0).round() as u32)
    }

    /// Absolute image URL under `base_url`.
    pub fn image_url(&self, base_url: &str) -> String {
        match self.photo.as_deref().map(str::trim) {
            Some(photo) if photo.starts_with("http://") || photo.starts_with("https://") => {
                photo.to_string()
            }
            Some(photo) if !photo.is_empty() => format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                photo.trim_start_matches('/')
            ),
            _ => String::new(),
        }
    }

    /// The cart line fields for this product.
    pub fn to_cart_product(&self, base_url: &str) -> Result<CartProduct, CommerceError> {
        let id = self
            .id
            .clone()
            .ok_or_else(|| CommerceError::ValidationError(format!("{} n'a pas d'identifiant", self.name)))?;
        Ok(CartProduct {
            id,
            name: self.name.clone(),
            unit_price: self.price,
            image: self.image_url(base_url),
        })
    }

    /// Admin form rules.
    pub fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("Nom", "Nom requis"));
        }
        if self.price.is_negative() {
            errors.push(FieldError::new("Prix", "Le prix doit être positif"));
        }
        if self.category_id.as_ref().map_or(true, |c| c.as_str().trim().is_empty()) {
            errors.push(FieldError::new("ID_CAT", "Catégorie requise"));
        }
        if self.promotion {
            match self.old_price {
                None => errors.push(FieldError::new("AncienPrix", "Prix avant promotion requis")),
                Some(old) if old == self.price => errors.push(FieldError::new(
                    "AncienPrix",
                    "Le prix promotionnel doit être différent du prix actuel",
                )),
                Some(old) if old.amount_cents < self.price.amount_cents => {
                    errors.push(FieldError::new(
                        "AncienPrix",
                        "Le prix promotionnel doit être inférieur au prix avant promotion",
                    ))
                }
                Some(_) => {}
            }
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

    #[test]
    fn test_reads_api_row() {
        let json = r#"{
            "ID_ART": 3, "Nom": "Savon noir", "Description": null,
            "Prix": "8.50", "AncienPrix": 10, "Promotion": 1, "Visible": 1,
            "Quantite": 14, "ID_CAT": 2, "Photo": "/uploads/savon.png"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, Some(ProductId::new("3")));
        assert_eq!(product.price.amount_cents, 850);
        assert!(product.promotion);
        assert_eq!(product.discount_percent(), Some(15));
        assert_eq!(
            product.image_url("http://localhost:3000/"),
            "http://localhost:3000/uploads/savon.png"
        );
    }

    #[test]
    fn test_new_product_omits_id() {
        let product = Product::new("Huile d'argan", Money::eur(19.0), "2");
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("ID_ART").is_none());
        assert_eq!(json["Prix"], 19.0);
        assert_eq!(json["Visible"], true);
    }

    #[test]
    fn test_no_discount_without_promotion() {
        let mut product = Product::new("Thé", Money::eur(5.0), "1");
        product.old_price = Some(Money::eur(10.0));
        assert_eq!(product.discount_percent(), None);
    }

    #[test]
    fn test_promotion_price_rules() {
        let same = Product::new("Thé", Money::eur(5.0), "1").on_promotion(Money::eur(5.0));
        assert_eq!(
            same.field_errors()[0].message,
            "Le prix promotionnel doit être différent du prix actuel"
        );

        let lower = Product::new("Thé", Money::eur(5.0), "1").on_promotion(Money::eur(4.0));
        assert_eq!(lower.field_errors().len(), 1);

        let mut missing = Product::new("Thé", Money::eur(5.0), "1");
        missing.promotion = true;
        assert_eq!(missing.field_errors()[0].message, "Prix avant promotion requis");

        let ok = Product::new("Thé", Money::eur(5.0), "1").on_promotion(Money::eur(6.0));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_required_fields() {
        let mut product = Product::new(" ", Money::eur(-1.0), "1");
        product.category_id = None;
        let fields: Vec<_> = product.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["Nom", "Prix", "ID_CAT"]);
    }

    #[test]
    fn test_to_cart_product_needs_id() {
        let mut product = Product::new("Thé", Money::eur(5.0), "1");
        assert!(product.to_cart_product("http://api").is_err());

        product.id = Some(ProductId::new("9"));
        product.photo = Some("the.png".to_string());
        let line = product.to_cart_product("http://api").unwrap();
        assert_eq!(line.image, "http://api/the.png");
        assert_eq!(line.unit_price, Money::eur(5.0));
    }
}
