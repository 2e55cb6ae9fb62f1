//! Checkout wizard state machine.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::CartState;
use crate::checkout::{CustomerForm, DeliveryRequirement, PaymentMethod};
use crate::error::CommerceError;
use crate::ids::DeliveryMethodId;
use crate::notice::{messages, Notice};

/// Steps in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    /// Cart review.
    Cart,
    /// Customer and address form.
    Information,
    /// Delivery method selection.
    Delivery,
    /// Payment and submission.
    Payment,
}

impl CheckoutStep {
    pub const ALL: [CheckoutStep; 4] = [
        CheckoutStep::Cart,
        CheckoutStep::Information,
        CheckoutStep::Delivery,
        CheckoutStep::Payment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Cart => "cart",
            CheckoutStep::Information => "information",
            CheckoutStep::Delivery => "delivery",
            CheckoutStep::Payment => "payment",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CheckoutStep::Cart => "Panier",
            CheckoutStep::Information => "Informations",
            CheckoutStep::Delivery => "Livraison",
            CheckoutStep::Payment => "Paiement",
        }
    }

    /// Get the step number (1-indexed).
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::Cart => 1,
            CheckoutStep::Information => 2,
            CheckoutStep::Delivery => 3,
            CheckoutStep::Payment => 4,
        }
    }

    pub fn previous(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::Cart => None,
            CheckoutStep::Information => Some(CheckoutStep::Cart),
            CheckoutStep::Delivery => Some(CheckoutStep::Information),
            CheckoutStep::Payment => Some(CheckoutStep::Delivery),
        }
    }
}

/// Condition checked before a forward transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The cart has at least one line.
    CartNotEmpty,
    /// The customer form validates.
    CustomerFormValid,
    /// A delivery method is selected. Enforced only under
    /// [`DeliveryRequirement::Required`].
    DeliverySelected,
}

/// One forward edge of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CheckoutStep,
    pub to: CheckoutStep,
    pub guard: Guard,
}

const TRANSITIONS: [Transition; 3] = [
    Transition {
        from: CheckoutStep::Cart,
        to: CheckoutStep::Information,
        guard: Guard::CartNotEmpty,
    },
    Transition {
        from: CheckoutStep::Information,
        to: CheckoutStep::Delivery,
        guard: Guard::CustomerFormValid,
    },
    Transition {
        from: CheckoutStep::Delivery,
        to: CheckoutStep::Payment,
        guard: Guard::DeliverySelected,
    },
];

/// The forward transitions, in order. `Payment` has none; submission is
/// handled by [`CheckoutWizard::begin_submission`].
pub fn transition_table() -> &'static [Transition] {
    &TRANSITIONS
}

fn transition_from(step: CheckoutStep) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == step)
}

/// Result of a successful forward move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub step: CheckoutStep,
    /// Set when an advisory guard failed but the move was allowed.
    pub warning: Option<Notice>,
}

/// Answer to a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    /// Nothing in flight; the wizard was reset.
    Closed,
    /// A submission is in flight; ask before calling
    /// [`CheckoutWizard::confirm_close`].
    ConfirmRequired,
}

/// The four-step checkout wizard.
///
/// Steps only move one at a time. Forward moves go through the guard of
/// their [`Transition`]; backward moves are always allowed outside a
/// submission and keep every entered value.
#[derive(Debug, Clone)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    customer: CustomerForm,
    delivery: Option<DeliveryMethodId>,
    payment: Option<PaymentMethod>,
    submitting: bool,
    last_error: Option<Notice>,
    requirement: DeliveryRequirement,
}

impl CheckoutWizard {
    pub fn new(requirement: DeliveryRequirement) -> Self {
        Self {
            step: CheckoutStep::Cart,
            customer: CustomerForm::default(),
            delivery: None,
            payment: None,
            submitting: false,
            last_error: None,
            requirement,
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn requirement(&self) -> DeliveryRequirement {
        self.requirement
    }

    pub fn customer(&self) -> &CustomerForm {
        &self.customer
    }

    pub fn set_customer(&mut self, customer: CustomerForm) {
        self.customer = customer;
    }

    pub fn delivery(&self) -> Option<&DeliveryMethodId> {
        self.delivery.as_ref()
    }

    pub fn select_delivery(&mut self, id: Option<DeliveryMethodId>) {
        self.delivery = id;
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment = Some(method);
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Error from the last failed submission.
    pub fn last_error(&self) -> Option<&Notice> {
        self.last_error.as_ref()
    }

    fn check_guard(&self, guard: Guard, cart: &CartState) -> Result<Option<Notice>, CommerceError> {
        match guard {
            Guard::CartNotEmpty if cart.is_empty() => Err(CommerceError::EmptyCart),
            Guard::CustomerFormValid => self.customer.validate().map(|_| None),
            Guard::DeliverySelected if self.delivery.is_none() => match self.requirement {
                DeliveryRequirement::Required => Err(CommerceError::CheckoutIncomplete(
                    "mode de livraison".to_string(),
                )),
                DeliveryRequirement::Advisory => {
                    Ok(Some(Notice::warning(messages::DELIVERY_NOT_SELECTED)))
                }
            },
            _ => Ok(None),
        }
    }

    /// Evaluate the guard of the current step's forward transition.
    ///
    /// `Ok(Some(_))` means the move is allowed with a warning.
    pub fn can_advance(&self, cart: &CartState) -> Result<Option<Notice>, CommerceError> {
        if self.submitting {
            return Err(CommerceError::SubmissionInFlight);
        }
        let transition = transition_from(self.step).ok_or_else(|| self.no_edge("next"))?;
        self.check_guard(transition.guard, cart)
    }

    /// Move to the next step if its guard allows it.
    pub fn next(&mut self, cart: &CartState) -> Result<Advance, CommerceError> {
        let warning = self.can_advance(cart)?;
        let transition = transition_from(self.step).ok_or_else(|| self.no_edge("next"))?;
        debug!(from = transition.from.as_str(), to = transition.to.as_str(), "checkout advanced");
        self.step = transition.to;
        Ok(Advance {
            step: self.step,
            warning,
        })
    }

    /// Move to the previous step.
    pub fn back(&mut self) -> Result<CheckoutStep, CommerceError> {
        if self.submitting {
            return Err(CommerceError::SubmissionInFlight);
        }
        let previous = self.step.previous().ok_or_else(|| self.no_edge("previous"))?;
        self.step = previous;
        Ok(previous)
    }

    /// Mark a submission as started. Only allowed on the Payment step, once.
    pub fn begin_submission(&mut self) -> Result<(), CommerceError> {
        if self.step != CheckoutStep::Payment {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.step.as_str().to_string(),
                to: "submit".to_string(),
            });
        }
        if self.submitting {
            return Err(CommerceError::SubmissionInFlight);
        }
        self.submitting = true;
        self.last_error = None;
        Ok(())
    }

    /// Record the submission outcome.
    ///
    /// Success resets the wizard to the Cart step with empty fields. Failure
    /// keeps everything on Payment and retains the error.
    pub fn finish_submission<T>(&mut self, outcome: &Result<T, CommerceError>) {
        self.submitting = false;
        match outcome {
            Ok(_) => {
                info!("checkout completed");
                self.reset();
            }
            Err(e) => {
                self.last_error = Some(e.notice());
            }
        }
    }

    /// Ask to close the wizard.
    pub fn request_close(&mut self) -> CloseRequest {
        if self.submitting {
            CloseRequest::ConfirmRequired
        } else {
            self.reset();
            CloseRequest::Closed
        }
    }

    /// Close after the user confirmed.
    ///
    /// Local state is reset. A request already sent is not cancelled.
    pub fn confirm_close(&mut self) {
        if self.submitting {
            info!("checkout closed while a submission was in flight");
        }
        self.submitting = false;
        self.reset();
    }

    /// Back to an empty wizard on the Cart step.
    pub fn reset(&mut self) {
        self.step = CheckoutStep::Cart;
        self.customer = CustomerForm::default();
        self.delivery = None;
        self.payment = None;
        self.last_error = None;
    }

    fn no_edge(&self, direction: &str) -> CommerceError {
        CommerceError::InvalidCheckoutTransition {
            from: self.step.as_str().to_string(),
            to: direction.to_string(),
        }
    }
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new(DeliveryRequirement::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartProduct, CartStore};
    use crate::money::Money;
    use baya_store::MemoryStore;

    fn filled_cart() -> CartState {
        let mut store = CartStore::load(MemoryStore::new());
        store
            .add_item(CartProduct::new("A1", "Dattes", Money::eur(20.0), "/a1.png"), 1)
            .unwrap();
        store.state().clone()
    }

    fn valid_customer() -> CustomerForm {
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

    fn wizard_at_delivery(requirement: DeliveryRequirement) -> (CheckoutWizard, CartState) {
        let cart = filled_cart();
        let mut wizard = CheckoutWizard::new(requirement);
        wizard.next(&cart).unwrap();
        wizard.set_customer(valid_customer());
        wizard.next(&cart).unwrap();
        (wizard, cart)
    }

    #[test]
    fn test_transition_table_is_linear() {
        let table = transition_table();
        assert_eq!(table.len(), 3);
        for pair in table.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        assert!(transition_from(CheckoutStep::Payment).is_none());
    }

    #[test]
    fn test_empty_cart_blocks_information() {
        let mut wizard = CheckoutWizard::default();
        let err = wizard.next(&CartState::default()).unwrap_err();
        assert!(matches!(err, CommerceError::EmptyCart));
        assert_eq!(wizard.step(), CheckoutStep::Cart);
    }

    #[test]
    fn test_invalid_form_blocks_delivery() {
        let cart = filled_cart();
        let mut wizard = CheckoutWizard::default();
        wizard.next(&cart).unwrap();

        let err = wizard.next(&cart).unwrap_err();

        assert!(matches!(err, CommerceError::FormInvalid(_)));
        assert_eq!(wizard.step(), CheckoutStep::Information);
    }

    #[test]
    fn test_advisory_delivery_advances_with_warning() {
        let (mut wizard, cart) = wizard_at_delivery(DeliveryRequirement::Advisory);

        let advance = wizard.next(&cart).unwrap();

        assert_eq!(advance.step, CheckoutStep::Payment);
        assert_eq!(
            advance.warning.map(|n| n.text),
            Some(messages::DELIVERY_NOT_SELECTED.to_string())
        );
    }

    #[test]
    fn test_required_delivery_blocks_payment() {
        let (mut wizard, cart) = wizard_at_delivery(DeliveryRequirement::Required);
        assert!(wizard.next(&cart).is_err());

        wizard.select_delivery(Some(DeliveryMethodId::new("express")));
        let advance = wizard.next(&cart).unwrap();
        assert_eq!(advance.step, CheckoutStep::Payment);
        assert!(advance.warning.is_none());
    }

    #[test]
    fn test_payment_has_no_next() {
        let (mut wizard, cart) = wizard_at_delivery(DeliveryRequirement::Advisory);
        wizard.next(&cart).unwrap();
        assert!(matches!(
            wizard.next(&cart),
            Err(CommerceError::InvalidCheckoutTransition { .. })
        ));
    }

    #[test]
    fn test_back_keeps_entered_data() {
        let (mut wizard, _) = wizard_at_delivery(DeliveryRequirement::Advisory);
        wizard.select_delivery(Some(DeliveryMethodId::new("standard")));

        assert_eq!(wizard.back().unwrap(), CheckoutStep::Information);
        assert_eq!(wizard.back().unwrap(), CheckoutStep::Cart);
        assert!(wizard.back().is_err());

        assert_eq!(wizard.customer(), &valid_customer());
        assert_eq!(wizard.delivery(), Some(&DeliveryMethodId::new("standard")));
    }

    #[test]
    fn test_submission_lifecycle() {
        let (mut wizard, cart) = wizard_at_delivery(DeliveryRequirement::Advisory);
        assert!(wizard.begin_submission().is_err());
        wizard.next(&cart).unwrap();

        wizard.begin_submission().unwrap();
        assert!(matches!(
            wizard.begin_submission(),
            Err(CommerceError::SubmissionInFlight)
        ));
        assert!(wizard.back().is_err());

        let failed: Result<(), CommerceError> = Err(CommerceError::OrderRejected("Stock épuisé".into()));
        wizard.finish_submission(&failed);
        assert_eq!(wizard.step(), CheckoutStep::Payment);
        assert_eq!(wizard.last_error().unwrap().text, "Stock épuisé");
        assert_eq!(wizard.customer(), &valid_customer());

        wizard.begin_submission().unwrap();
        wizard.finish_submission(&Ok(()));
        assert_eq!(wizard.step(), CheckoutStep::Cart);
        assert_eq!(wizard.customer(), &CustomerForm::default());
        assert!(wizard.last_error().is_none());
    }

    #[test]
    fn test_close_requires_confirmation_while_submitting() {
        let (mut wizard, cart) = wizard_at_delivery(DeliveryRequirement::Advisory);
        wizard.next(&cart).unwrap();
        wizard.begin_submission().unwrap();

        assert_eq!(wizard.request_close(), CloseRequest::ConfirmRequired);
        assert_eq!(wizard.step(), CheckoutStep::Payment);

        wizard.confirm_close();
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.step(), CheckoutStep::Cart);
    }

    #[test]
    fn test_close_when_idle_resets() {
        let (mut wizard, _) = wizard_at_delivery(DeliveryRequirement::Advisory);
        assert_eq!(wizard.request_close(), CloseRequest::Closed);
        assert_eq!(wizard.step(), CheckoutStep::Cart);
    }
}
