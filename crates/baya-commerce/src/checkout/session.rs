//! The async side of checkout: stock review, payment and order submission.

use baya_store::KvStore;
use tracing::{info, warn};

use crate::cart::{CartState, CartStore, StockOracle};
use crate::catalog::OrderStatus;
use crate::checkout::{
    CheckoutWizard, DeliveryMethod, DeliveryRequirement, OrderGateway, OrderResponse,
    OrderSubmission, PaymentMethod, PaymentProvider,
};
use crate::error::CommerceError;
use crate::ids::{ClientId, DeliveryMethodId, ProductId};
use crate::money::Money;
use crate::notice::messages;

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub submission: OrderSubmission,
    pub response: OrderResponse,
}

/// One checkout attempt: the wizard plus the offered delivery methods.
pub struct CheckoutSession {
    wizard: CheckoutWizard,
    methods: Vec<DeliveryMethod>,
    client_id: Option<ClientId>,
}

impl CheckoutSession {
    pub fn new(methods: Vec<DeliveryMethod>, requirement: DeliveryRequirement) -> Self {
        Self {
            wizard: CheckoutWizard::new(requirement),
            methods,
            client_id: None,
        }
    }

    pub fn with_client(mut self, client_id: Option<ClientId>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn wizard(&self) -> &CheckoutWizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut CheckoutWizard {
        &mut self.wizard
    }

    pub fn methods(&self) -> &[DeliveryMethod] {
        &self.methods
    }

    /// Select one of the offered delivery methods.
    pub fn select_delivery(&mut self, id: &DeliveryMethodId) -> Result<&DeliveryMethod, CommerceError> {
        let method = self
            .methods
            .iter()
            .find(|m| &m.id == id)
            .ok_or_else(|| CommerceError::ValidationError(messages::DELIVERY_NOT_SELECTED.to_string()))?;
        self.wizard.select_delivery(Some(method.id.clone()));
        Ok(method)
    }

    pub fn selected_delivery(&self) -> Option<&DeliveryMethod> {
        let id = self.wizard.delivery()?;
        self.methods.iter().find(|m| &m.id == id)
    }

    /// Cart total plus the selected delivery price.
    pub fn amount_due(&self, cart: &CartState) -> Result<Money, CommerceError> {
        match self.selected_delivery() {
            Some(method) => cart
                .total
                .try_add(&method.price)
                .ok_or(CommerceError::Overflow),
            None => Ok(cart.total),
        }
    }

    /// Re-check the whole cart when checkout opens.
    ///
    /// Returns the lines whose quantity is no longer available.
    pub async fn open<S: KvStore>(
        &mut self,
        store: &mut CartStore<S>,
        oracle: &dyn StockOracle,
    ) -> Result<Vec<ProductId>, CommerceError> {
        self.wizard.reset();
        store.refresh_stock(oracle).await
    }

    /// Build the order payload for the current cart and wizard state.
    pub fn build_submission(
        &self,
        cart: &CartState,
        status: OrderStatus,
        payment: PaymentMethod,
    ) -> Result<OrderSubmission, CommerceError> {
        OrderSubmission::assemble(
            cart,
            self.wizard.customer(),
            self.selected_delivery(),
            self.client_id.clone(),
            self.amount_due(cart)?,
            status,
            payment,
        )
    }

    /// Pay if needed, then post the order once.
    ///
    /// On success the cart is cleared and the wizard reset. On failure the
    /// wizard stays on Payment with the error retained and the cart is kept.
    pub async fn submit<S: KvStore>(
        &mut self,
        store: &mut CartStore<S>,
        gateway: &dyn OrderGateway,
        payment: &dyn PaymentProvider,
    ) -> Result<OrderReceipt, CommerceError> {
        self.wizard.begin_submission()?;
        let outcome = self.place(store.state(), gateway, payment).await;
        self.wizard.finish_submission(&outcome);

        if outcome.is_ok() {
            if let Err(e) = store.clear() {
                warn!(error = %e, "order placed but the cart could not be cleared");
            }
        }
        outcome
    }

    async fn place(
        &self,
        cart: &CartState,
        gateway: &dyn OrderGateway,
        payment: &dyn PaymentProvider,
    ) -> Result<OrderReceipt, CommerceError> {
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }
        self.wizard.customer().validate()?;
        if self.wizard.requirement() == DeliveryRequirement::Required
            && self.selected_delivery().is_none()
        {
            return Err(CommerceError::CheckoutIncomplete("mode de livraison".to_string()));
        }
        let method = self
            .wizard
            .payment_method()
            .ok_or_else(|| CommerceError::CheckoutIncomplete("mode de paiement".to_string()))?;

        let submission = match method {
            PaymentMethod::Card => {
                let amount = self.amount_due(cart)?;
                let secret = gateway.create_payment_intent(amount.amount_cents).await?;
                let confirmation = payment.confirm(&secret, amount).await?;
                info!(intent = %confirmation.intent_id, "payment confirmed");
                self.build_submission(cart, OrderStatus::Paid, method)?
                    .with_payment_intent(confirmation.intent_id)
            }
            PaymentMethod::Paypal => self.build_submission(cart, OrderStatus::Pending, method)?,
        };

        let response = gateway.submit_order(&submission).await?;
        if !response.success {
            let message = response
                .message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| messages::ORDER_FAILED.to_string());
            return Err(CommerceError::OrderRejected(message));
        }
        info!(order = ?response.order_id, amount = submission.amount.amount_cents, "order placed");
        Ok(OrderReceipt {
            submission,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartProduct, StockStatus};
    use crate::checkout::{CheckoutStep, CustomerForm, PaymentConfirmation};
    use async_trait::async_trait;
    use baya_store::MemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        reject_with: Option<String>,
        intents: Mutex<Vec<i64>>,
        orders: Mutex<Vec<OrderSubmission>>,
    }

    #[async_trait]
    impl OrderGateway for FakeGateway {
        async fn create_payment_intent(&self, amount_minor: i64) -> Result<String, CommerceError> {
            self.intents.lock().unwrap().push(amount_minor);
            Ok("pi_42_secret_abc".to_string())
        }

        async fn submit_order(&self, order: &OrderSubmission) -> Result<OrderResponse, CommerceError> {
            self.orders.lock().unwrap().push(order.clone());
            Ok(OrderResponse {
                success: self.reject_with.is_none(),
                message: self.reject_with.clone(),
                order_id: None,
            })
        }
    }

    struct FakeProvider {
        decline: bool,
    }

    #[async_trait]
    impl PaymentProvider for FakeProvider {
        async fn confirm(
            &self,
            client_secret: &str,
            _amount: Money,
        ) -> Result<PaymentConfirmation, CommerceError> {
            if self.decline {
                return Err(CommerceError::PaymentFailed("Carte refusée".to_string()));
            }
            Ok(PaymentConfirmation {
                intent_id: client_secret.split("_secret_").next().unwrap_or_default().to_string(),
            })
        }
    }

    struct AllInStock;

    #[async_trait]
    impl StockOracle for AllInStock {
        async fn check(&self, _id: &ProductId, quantity: u32) -> Result<StockStatus, CommerceError> {
            Ok(StockStatus::available(quantity + 10))
        }
    }

    fn customer() -> CustomerForm {
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

    async fn ready_session(
        method: PaymentMethod,
    ) -> (CheckoutSession, CartStore<MemoryStore>) {
        let mut store = CartStore::load(MemoryStore::new());
        store
            .add_item(CartProduct::new("A1", "Dattes", Money::eur(20.0), "/a1.png"), 2)
            .unwrap();
        let mut session = CheckoutSession::new(DeliveryMethod::defaults(), DeliveryRequirement::Advisory)
            .with_client(Some(ClientId::new("7")));
        assert!(session.open(&mut store, &AllInStock).await.unwrap().is_empty());

        session.wizard_mut().next(store.state()).unwrap();
        session.wizard_mut().set_customer(customer());
        session.wizard_mut().next(store.state()).unwrap();
        session.select_delivery(&DeliveryMethodId::new("express")).unwrap();
        session.wizard_mut().next(store.state()).unwrap();
        session.wizard_mut().set_payment_method(method);
        (session, store)
    }

    #[test]
    fn test_amount_due_includes_delivery() {
        let mut store = CartStore::load(MemoryStore::new());
        store
            .add_item(CartProduct::new("A1", "Dattes", Money::eur(20.0), "/a1.png"), 2)
            .unwrap();
        let mut session = CheckoutSession::new(DeliveryMethod::defaults(), DeliveryRequirement::Advisory);
        assert_eq!(session.amount_due(store.state()).unwrap(), Money::eur(40.0));

        session.select_delivery(&DeliveryMethodId::new("express")).unwrap();
        assert_eq!(session.amount_due(store.state()).unwrap(), Money::eur(49.9));
        assert!(session.select_delivery(&DeliveryMethodId::new("drone")).is_err());
    }

    #[tokio::test]
    async fn test_card_payment_posts_paid_order_and_clears_cart() {
        let (mut session, mut store) = ready_session(PaymentMethod::Card).await;
        let gateway = FakeGateway::default();

        let receipt = session
            .submit(&mut store, &gateway, &FakeProvider { decline: false })
            .await
            .unwrap();

        assert_eq!(*gateway.intents.lock().unwrap(), vec![4990]);
        assert_eq!(receipt.submission.status, OrderStatus::Paid);
        assert_eq!(receipt.submission.payment_intent_id.as_deref(), Some("pi_42"));
        assert_eq!(gateway.orders.lock().unwrap().len(), 1);
        assert!(store.is_empty());
        assert_eq!(session.wizard().step(), CheckoutStep::Cart);
    }

    #[tokio::test]
    async fn test_paypal_posts_pending_without_intent() {
        let (mut session, mut store) = ready_session(PaymentMethod::Paypal).await;
        let gateway = FakeGateway::default();

        let receipt = session
            .submit(&mut store, &gateway, &FakeProvider { decline: true })
            .await
            .unwrap();

        assert!(gateway.intents.lock().unwrap().is_empty());
        assert_eq!(receipt.submission.status, OrderStatus::Pending);
        assert_eq!(receipt.submission.payment_mode, "paypal");
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_cart_and_step() {
        let (mut session, mut store) = ready_session(PaymentMethod::Paypal).await;
        let gateway = FakeGateway {
            reject_with: Some("Stock épuisé pour Dattes".to_string()),
            ..Default::default()
        };

        let err = session
            .submit(&mut store, &gateway, &FakeProvider { decline: false })
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::OrderRejected(_)));
        assert_eq!(store.items().len(), 1);
        assert_eq!(session.wizard().step(), CheckoutStep::Payment);
        assert_eq!(
            session.wizard().last_error().unwrap().text,
            "Stock épuisé pour Dattes"
        );
        assert!(!session.wizard().is_submitting());
    }

    #[tokio::test]
    async fn test_declined_card_never_posts_order() {
        let (mut session, mut store) = ready_session(PaymentMethod::Card).await;
        let gateway = FakeGateway::default();

        let err = session
            .submit(&mut store, &gateway, &FakeProvider { decline: true })
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::PaymentFailed(_)));
        assert!(gateway.orders.lock().unwrap().is_empty());
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_submit_outside_payment_step() {
        let (mut session, mut store) = ready_session(PaymentMethod::Card).await;
        session.wizard_mut().reset();
        let err = session
            .submit(&mut store, &FakeGateway::default(), &FakeProvider { decline: false })
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidCheckoutTransition { .. }));
    }
}
