//! Orders as listed in the back-office.

use serde::{Deserialize, Serialize};

use crate::checkout::{CustomerForm, OrderLine};
use crate::error::CommerceError;
use crate::ids::{ClientId, OrderId};
use crate::money::Money;
use crate::wire::decimal_money;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting payment or preparation.
    #[default]
    Pending,
    /// Paid online at checkout.
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The statuses an administrator can set.
    pub const ADMIN_CHOICES: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// French label.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "En attente",
            OrderStatus::Paid => "Payée",
            OrderStatus::Processing => "En préparation",
            OrderStatus::Shipped => "En livraison",
            OrderStatus::Delivered => "Livrée",
            OrderStatus::Cancelled => "Annulée",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Position on the fulfilment timeline; `None` once cancelled.
    pub fn progress(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending | OrderStatus::Paid => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "ID_CMD", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,
    #[serde(rename = "id_clt", default)]
    pub client_id: Option<ClientId>,
    #[serde(rename = "statut_CMD", default)]
    pub status: OrderStatus,
    #[serde(rename = "montant", with = "decimal_money")]
    pub amount: Money,
    #[serde(rename = "mode_payement", default)]
    pub payment_mode: Option<String>,
    /// JSON array of order lines.
    #[serde(rename = "detail_cmd", default)]
    pub details: Option<String>,
    /// JSON customer address.
    #[serde(rename = "adresse_livraison", default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub code_promo: Option<String>,
    #[serde(rename = "Date_cmd", default)]
    pub placed_at: Option<String>,
}

impl Order {
    /// Decode `detail_cmd`.
    pub fn lines(&self) -> Result<Vec<OrderLine>, CommerceError> {
        match self.details.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Decode `adresse_livraison`.
    pub fn address(&self) -> Result<Option<CustomerForm>, CommerceError> {
        match self.delivery_address.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(raw)?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_and_labels() {
        assert_eq!(serde_json::to_string(&OrderStatus::Shipped).unwrap(), "\"shipped\"");
        assert_eq!(OrderStatus::from_str("Canceled"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::Delivered.label(), "Livrée");
        assert_eq!(OrderStatus::Cancelled.progress(), None);
    }

    #[test]
    fn test_order_decodes_embedded_documents() {
        let json = serde_json::json!({
            "ID_CMD": 31,
            "id_clt": null,
            "statut_CMD": "paid",
            "montant": 49.9,
            "mode_payement": "stripe",
            "detail_cmd": "[{\"id\":\"A1\",\"name\":\"Dattes\",\"price\":20,\"image\":\"/a1.png\",\"quantity\":2}]",
            "adresse_livraison": "{\"fullName\":\"Amina Benali\",\"email\":\"amina@example.fr\",\"phone\":\"0612345678\",\"address\":\"12 rue des Lilas\",\"postalCode\":\"75011\",\"city\":\"paris\"}",
            "Date_cmd": "2024-06-02T10:30:00.000Z"
        });
        let order: Order = serde_json::from_value(json).unwrap();

        assert_eq!(order.amount.amount_cents, 4990);
        assert_eq!(order.status, OrderStatus::Paid);
        let lines = order.lines().unwrap();
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(order.address().unwrap().unwrap().city, "paris");
    }

    #[test]
    fn test_garbled_details_is_an_error() {
        let mut order: Order = serde_json::from_str(r#"{"montant":0}"#).unwrap();
        assert!(order.lines().unwrap().is_empty());
        order.details = Some("{oops".to_string());
        assert!(matches!(order.lines(), Err(CommerceError::SerializationError(_))));
    }
}
