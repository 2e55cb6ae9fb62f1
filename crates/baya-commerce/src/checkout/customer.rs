//! Customer information form.

use serde::{Deserialize, Serialize};

use crate::error::{CommerceError, FieldError};

/// Shipping contact details entered during checkout.
///
/// Serializes in the shape the order endpoint expects for
/// `adresse_livraison`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl CustomerForm {
    /// Every failing field with its message, in form order.
    pub fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let name = self.full_name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("fullName", "Veuillez saisir votre nom complet"));
        } else if name.chars().count() < 2 {
            errors.push(FieldError::new(
                "fullName",
                "Le nom doit contenir au moins 2 caractères",
            ));
        } else if name.chars().count() > 100 {
            errors.push(FieldError::new(
                "fullName",
                "Le nom ne peut pas dépasser 100 caractères",
            ));
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "Veuillez saisir votre email"));
        } else if email.chars().count() > 100 || !validator::validate_email(email) {
            errors.push(FieldError::new("email", "Email invalide"));
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.push(FieldError::new("phone", "Veuillez saisir votre téléphone"));
        } else if !is_french_phone(phone) {
            errors.push(FieldError::new("phone", "Numéro de téléphone invalide"));
        }

        let address = self.address.trim();
        if address.is_empty() {
            errors.push(FieldError::new("address", "Veuillez saisir votre adresse"));
        } else if address.chars().count() < 5 {
            errors.push(FieldError::new(
                "address",
                "L'adresse doit contenir au moins 5 caractères",
            ));
        } else if address.chars().count() > 200 {
            errors.push(FieldError::new(
                "address",
                "L'adresse ne peut pas dépasser 200 caractères",
            ));
        }

        let postal_code = self.postal_code.trim();
        if postal_code.is_empty() {
            errors.push(FieldError::new("postalCode", "Veuillez saisir votre code postal"));
        } else if postal_code.len() != 5 || !postal_code.bytes().all(|b| b.is_ascii_digit()) {
            errors.push(FieldError::new("postalCode", "Code postal invalide"));
        }

        if self.city.trim().is_empty() {
            errors.push(FieldError::new("city", "Veuillez sélectionner votre ville"));
        }

        if let Some(info) = &self.additional_info {
            if info.chars().count() > 500 {
                errors.push(FieldError::new(
                    "additionalInfo",
                    "Les informations complémentaires ne peuvent pas dépasser 500 caractères",
                ));
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

    pub fn is_valid(&self) -> bool {
        self.field_errors().is_empty()
    }
}

/// `+33` or `0`, then a non-zero digit, then eight digits.
fn is_french_phone(phone: &str) -> bool {
    let rest = match phone.strip_prefix("+33") {
        Some(rest) => rest,
        None => match phone.strip_prefix('0') {
            Some(rest) => rest,
            None => return false,
        },
    };
    let bytes = rest.as_bytes();
    bytes.len() == 9 && bytes.iter().all(u8::is_ascii_digit) && bytes[0] != b'0'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> CustomerForm {
        CustomerForm {
            full_name: "Amina Benali".to_string(),
            email: "amina@example.fr".to_string(),
            phone: "0612345678".to_string(),
            address: "12 rue des Lilas".to_string(),
            postal_code: "75011".to_string(),
            city: "paris".to_string(),
            additional_info: None,
        }
    }

    fn failing_fields(form: &CustomerForm) -> Vec<&'static str> {
        form.field_errors().iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let fields = failing_fields(&CustomerForm::default());
        assert_eq!(
            fields,
            vec!["fullName", "email", "phone", "address", "postalCode", "city"]
        );
    }

    #[test]
    fn test_phone_formats() {
        assert!(is_french_phone("0612345678"));
        assert!(is_french_phone("+33612345678"));
        assert!(!is_french_phone("0012345678"));
        assert!(!is_french_phone("061234567"));
        assert!(!is_french_phone("06 12 34 56 78"));
        assert!(!is_french_phone("+44612345678"));
    }

    #[test]
    fn test_email_and_postal_code_formats() {
        let mut form = valid_form();
        form.email = "pas-un-email".to_string();
        form.postal_code = "7501".to_string();
        assert_eq!(failing_fields(&form), vec!["email", "postalCode"]);
    }

    #[test]
    fn test_length_limits() {
        let mut form = valid_form();
        form.full_name = "A".to_string();
        form.address = "rue".to_string();
        form.additional_info = Some("x".repeat(501));
        let errors = form.field_errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].message, "Le nom doit contenir au moins 2 caractères");
    }

    #[test]
    fn test_address_json_shape() {
        let json = serde_json::to_value(valid_form()).unwrap();
        assert_eq!(json["fullName"], "Amina Benali");
        assert_eq!(json["postalCode"], "75011");
        assert!(json["additionalInfo"].is_null());
    }
}
