//! Stock availability as reported by the stock oracle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::notice::messages;

/// Last known availability for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStatus {
    /// Units currently in stock.
    pub available: u32,
    /// Whether the requested quantity can be served.
    pub is_available: bool,
    /// Server-provided explanation, possibly empty.
    #[serde(default)]
    pub message: String,
}

impl StockStatus {
    pub fn available(available: u32) -> Self {
        Self {
            available,
            is_available: true,
            message: String::new(),
        }
    }

    pub fn unavailable(available: u32, message: impl Into<String>) -> Self {
        Self {
            available,
            is_available: false,
            message: message.into(),
        }
    }

    /// The message to show when the quantity was refused.
    pub fn refusal_message(&self) -> &str {
        if self.message.trim().is_empty() {
            messages::STOCK_UNAVAILABLE
        } else {
            &self.message
        }
    }

    /// Build the rejection error for `requested` units of `id`.
    pub(crate) fn rejection(&self, id: &ProductId, requested: u32) -> CommerceError {
        CommerceError::InsufficientStock {
            product_id: id.to_string(),
            requested,
            available: self.available,
            message: Some(self.refusal_message().to_string()),
        }
    }
}

/// Answers "can `quantity` units of `id` be bought right now?".
///
/// The answer is advisory: other shoppers race against it, and the order
/// endpoint has the final say.
#[async_trait]
pub trait StockOracle: Send + Sync {
    async fn check(&self, id: &ProductId, quantity: u32) -> Result<StockStatus, CommerceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let status: StockStatus =
            serde_json::from_str(r#"{"available":3,"isAvailable":false}"#).unwrap();
        assert_eq!(status, StockStatus::unavailable(3, ""));
        assert_eq!(status.refusal_message(), messages::STOCK_UNAVAILABLE);
    }

    #[test]
    fn test_rejection_carries_oracle_message() {
        let status = StockStatus::unavailable(1, "Il ne reste qu'un article");
        match status.rejection(&ProductId::new("A1"), 4) {
            CommerceError::InsufficientStock {
                requested,
                available,
                message,
                ..
            } => {
                assert_eq!(requested, 4);
                assert_eq!(available, 1);
                assert_eq!(message.as_deref(), Some("Il ne reste qu'un article"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
