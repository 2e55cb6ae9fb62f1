//! Checkout module.
//!
//! Contains the checkout wizard, customer form, delivery methods, the order
//! payload and the session that submits it.

mod customer;
mod delivery;
mod flow;
mod order;
mod session;

pub use customer::CustomerForm;
pub use delivery::{DeliveryMethod, DeliveryRequirement};
pub use flow::{transition_table, Advance, CheckoutStep, CheckoutWizard, CloseRequest, Guard, Transition};
pub use order::{
    OrderGateway, OrderLine, OrderResponse, OrderSubmission, PaymentConfirmation, PaymentMethod,
    PaymentProvider,
};
pub use session::{CheckoutSession, OrderReceipt};
