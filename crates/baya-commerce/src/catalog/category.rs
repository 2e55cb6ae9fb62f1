//! Category types.

use serde::{Deserialize, Serialize};

use crate::error::{CommerceError, FieldError};
use crate::ids::CategoryId;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "ID_CAT", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CategoryId>,
    #[serde(rename = "Nom")]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Photo", default)]
    pub photo: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            photo: None,
        }
    }

    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.name.trim().is_empty() {
            return Err(CommerceError::FormInvalid(vec![FieldError::new("Nom", "Nom requis")]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_api() {
        let c: Category = serde_json::from_str(r#"{"ID_CAT":2,"Nom":"Épicerie"}"#).unwrap();
        assert_eq!(c.id, Some(CategoryId::new("2")));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_name_required() {
        let err = Category::new("  ").validate().unwrap_err();
        assert_eq!(err.notice().text, "Nom requis");
    }
}
