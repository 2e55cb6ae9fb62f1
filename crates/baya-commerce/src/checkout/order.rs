//! Outbound order payload and the gateways that receive it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cart::{CartState, LineItem};
use crate::catalog::OrderStatus;
use crate::checkout::{CustomerForm, DeliveryMethod};
use crate::error::CommerceError;
use crate::ids::{ClientId, DeliveryMethodId, OrderId, ProductId};
use crate::money::Money;

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card payment through the payment provider. The order is posted as paid.
    #[serde(rename = "stripe")]
    Card,
    /// Settled outside the storefront. The order is posted as pending.
    Paypal,
}

impl PaymentMethod {
    /// Value sent as `mode_payement`.
    pub fn mode(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "stripe",
            PaymentMethod::Paypal => "paypal",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Carte bancaire",
            PaymentMethod::Paypal => "PayPal",
        }
    }

    pub fn from_mode(mode: &str) -> Option<Self> {
        match mode.trim().to_lowercase().as_str() {
            "stripe" | "card" | "carte" => Some(PaymentMethod::Card),
            "paypal" => Some(PaymentMethod::Paypal),
            _ => None,
        }
    }
}

/// One line of `detail_cmd`, in the storefront's cart shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "crate::wire::decimal_money")]
    pub price: Money,
    pub image: String,
    pub quantity: u32,
}

impl From<&LineItem> for OrderLine {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.unit_price,
            image: item.image.clone(),
            quantity: item.quantity,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryChoice<'a> {
    method_id: Option<&'a DeliveryMethodId>,
    method: Option<&'a DeliveryMethod>,
}

#[derive(Serialize)]
struct OrderDetails<'a> {
    items: &'a [OrderLine],
    delivery: DeliveryChoice<'a>,
}

/// The body posted to the order endpoint.
///
/// `detail_cmd`, `details_de_command` and `adresse_livraison` are JSON
/// documents embedded as strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSubmission {
    #[serde(rename = "id_clt")]
    pub client_id: Option<ClientId>,
    #[serde(rename = "detail_cmd")]
    pub details: String,
    #[serde(rename = "details_de_command")]
    pub delivery_details: String,
    #[serde(rename = "statut_CMD")]
    pub status: OrderStatus,
    /// Cart total plus delivery.
    #[serde(rename = "montant", with = "crate::wire::decimal_money")]
    pub amount: Money,
    #[serde(rename = "mode_payement")]
    pub payment_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(rename = "adresse_livraison")]
    pub delivery_address: String,
    pub code_promo: Option<String>,
}

impl OrderSubmission {
    /// Assemble the payload from the cart, the form and the delivery choice.
    pub fn assemble(
        cart: &CartState,
        customer: &CustomerForm,
        delivery: Option<&DeliveryMethod>,
        client_id: Option<ClientId>,
        amount: Money,
        status: OrderStatus,
        payment: PaymentMethod,
    ) -> Result<Self, CommerceError> {
        let lines: Vec<OrderLine> = cart.items.iter().map(OrderLine::from).collect();
        let details = serde_json::to_string(&lines)?;
        let delivery_details = serde_json::to_string(&OrderDetails {
            items: &lines,
            delivery: DeliveryChoice {
                method_id: delivery.map(|m| &m.id),
                method: delivery,
            },
        })?;
        let delivery_address = serde_json::to_string(customer)?;
        let code_promo = cart.discount.as_ref().and_then(|d| d.code.clone());

        Ok(Self {
            client_id,
            details,
            delivery_details,
            status,
            amount,
            payment_mode: payment.mode().to_string(),
            payment_intent_id: None,
            delivery_address,
            code_promo,
        })
    }

    pub fn with_payment_intent(mut self, intent_id: impl Into<String>) -> Self {
        self.payment_intent_id = Some(intent_id.into());
        self
    }
}

/// Order endpoint answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "ID_CMD", alias = "orderId")]
    pub order_id: Option<OrderId>,
}

/// Outcome of a successful payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Payment intent id recorded with the order.
    pub intent_id: String,
}

/// The REST calls that place an order.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create a payment intent for `amount_minor` cents and return its client secret.
    async fn create_payment_intent(&self, amount_minor: i64) -> Result<String, CommerceError>;

    async fn submit_order(&self, order: &OrderSubmission) -> Result<OrderResponse, CommerceError>;
}

/// Confirms a card payment against a client secret.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn confirm(
        &self,
        client_secret: &str,
        amount: Money,
    ) -> Result<PaymentConfirmation, CommerceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartProduct, CartStore, DiscountRecord};
    use baya_store::MemoryStore;

    fn form() -> CustomerForm {
        CustomerForm {
            full_name: "Amina Benali".to_string(),
            email: "amina@example.fr".to_string(),
            phone: "0612345678".to_string(),
            address: "12 rue des Lilas".to_string(),
            postal_code: "75011".to_string(),
            city: "paris".to_string(),
            additional_info: Some("Digicode 1234".to_string()),
        }
    }

    #[test]
    fn test_payment_method_modes() {
        assert_eq!(PaymentMethod::Card.mode(), "stripe");
        assert_eq!(PaymentMethod::from_mode("PayPal"), Some(PaymentMethod::Paypal));
        assert_eq!(PaymentMethod::from_mode("cheque"), None);
        assert_eq!(serde_json::to_string(&PaymentMethod::Card).unwrap(), "\"stripe\"");
    }

    #[test]
    fn test_submission_wire_shape() {
        let mut store = CartStore::load(MemoryStore::new());
        store
            .add_item(CartProduct::new("A1", "Dattes", Money::eur(20.0), "/a1.png"), 2)
            .unwrap();
        store
            .apply_discount(DiscountRecord::new(10.0, store.original_total()).with_code("DIX"))
            .unwrap();
        let express = DeliveryMethod::defaults().remove(1);

        let order = OrderSubmission::assemble(
            store.state(),
            &form(),
            Some(&express),
            Some(ClientId::new("7")),
            Money::eur(45.9),
            OrderStatus::Paid,
            PaymentMethod::Card,
        )
        .unwrap()
        .with_payment_intent("pi_123");

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id_clt"], 7);
        assert_eq!(json["statut_CMD"], "paid");
        assert_eq!(json["montant"], 45.9);
        assert_eq!(json["mode_payement"], "stripe");
        assert_eq!(json["payment_intent_id"], "pi_123");
        assert_eq!(json["code_promo"], "DIX");

        let lines: serde_json::Value =
            serde_json::from_str(json["detail_cmd"].as_str().unwrap()).unwrap();
        assert_eq!(lines[0]["id"], "A1");
        assert_eq!(lines[0]["price"], 20.0);
        assert_eq!(lines[0]["quantity"], 2);

        let details: serde_json::Value =
            serde_json::from_str(json["details_de_command"].as_str().unwrap()).unwrap();
        assert_eq!(details["delivery"]["methodId"], "express");
        assert_eq!(details["delivery"]["method"]["price"], 9.9);

        let address: serde_json::Value =
            serde_json::from_str(json["adresse_livraison"].as_str().unwrap()).unwrap();
        assert_eq!(address["city"], "paris");
        assert_eq!(address["additionalInfo"], "Digicode 1234");
    }

    #[test]
    fn test_pending_submission_omits_intent() {
        let order = OrderSubmission::assemble(
            &CartState::default(),
            &form(),
            None,
            None,
            Money::eur(0.0),
            OrderStatus::Pending,
            PaymentMethod::Paypal,
        )
        .unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("payment_intent_id").is_none());
        assert!(json["id_clt"].is_null());
        assert!(json["code_promo"].is_null());
    }

    #[test]
    fn test_order_response_defaults() {
        let r: OrderResponse = serde_json::from_str(r#"{"success":true,"ID_CMD":12}"#).unwrap();
        assert!(r.success);
        assert_eq!(r.order_id, Some(OrderId::new("12")));
        let r: OrderResponse = serde_json::from_str(r#"{"message":"Stock épuisé"}"#).unwrap();
        assert!(!r.success);
    }
}
