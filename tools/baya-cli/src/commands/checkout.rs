//! Interactive checkout.
//!
//! Drives the four-step wizard from the terminal: the cart is re-checked
//! against stock when checkout opens, then customer details, delivery and
//! payment are collected before the order is placed once.

use std::future::Future;
use std::path::Path;

use anyhow::{anyhow, bail, Context as _, Result};
use async_trait::async_trait;
use baya_commerce::cart::CartState;
use baya_commerce::checkout::{
    Advance, CheckoutSession, CheckoutStep, CloseRequest, CustomerForm, PaymentConfirmation,
    PaymentMethod, PaymentProvider,
};
use baya_commerce::notice::messages;
use baya_commerce::{CommerceError, DeliveryMethodId, FieldError, Money};
use dialoguer::{Confirm, Input, Select};
use tracing::{info, warn};

use super::{cart, stock_error, user_error, CheckoutArgs};
use crate::context::Context;

const STEPS: usize = CheckoutStep::ALL.len();

/// Card payment completed by the shopper on the provider page.
///
/// The order is only marked paid once `approve` answers yes for the client
/// secret. The intent id is the part of the secret before `_secret_`.
pub struct ClientSecretPayment<F> {
    approve: F,
}

impl<F> ClientSecretPayment<F>
where
    F: Fn(&str, Money) -> Result<bool> + Send + Sync,
{
    pub fn new(approve: F) -> Self {
        Self { approve }
    }
}

#[async_trait]
impl<F> PaymentProvider for ClientSecretPayment<F>
where
    F: Fn(&str, Money) -> Result<bool> + Send + Sync,
{
    async fn confirm(
        &self,
        client_secret: &str,
        amount: Money,
    ) -> Result<PaymentConfirmation, CommerceError> {
        let intent_id = intent_id(client_secret).ok_or_else(payment_failed)?;
        let paid = (self.approve)(client_secret, amount)
            .map_err(|e| CommerceError::PaymentFailed(format!("{:#}", e)))?;
        if !paid {
            warn!(intent = intent_id, "card payment not completed");
            return Err(payment_failed());
        }
        info!(intent = intent_id, amount = %amount.display(), "card payment confirmed");
        Ok(PaymentConfirmation {
            intent_id: intent_id.to_string(),
        })
    }
}

fn payment_failed() -> CommerceError {
    CommerceError::PaymentFailed(messages::PAYMENT_FAILED.to_string())
}

fn intent_id(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

fn approve_card(ctx: &Context, client_secret: &str, amount: Money) -> Result<bool> {
    ctx.output.info("Finalisez le paiement par carte sur la page du prestataire");
    ctx.output.kv("Montant", &amount.display());
    ctx.output.kv("Client secret", client_secret);
    Ok(Confirm::new()
        .with_prompt("Le paiement a-t-il été effectué ?")
        .default(false)
        .interact()?)
}

/// Wait for `submit`, asking `abandon` on every interrupt.
///
/// `None` means the shopper stopped waiting. A request already sent is not
/// cancelled.
async fn await_or_abandon<T, I, Fut>(
    submit: impl Future<Output = T>,
    mut interrupt: I,
    mut abandon: impl FnMut() -> Result<bool>,
) -> Result<Option<T>>
where
    I: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::pin!(submit);
    loop {
        tokio::select! {
            biased;
            outcome = &mut submit => return Ok(Some(outcome)),
            () = interrupt() => {
                if abandon()? {
                    return Ok(None);
                }
            }
        }
    }
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let mut store = ctx.open_cart()?;
    let mut session = ctx.checkout_session();

    let spinner = ctx.output.spinner("Vérification du stock...");
    let opened = session.open(&mut store, &api).await;
    spinner.finish_and_clear();
    let unavailable = opened.map_err(stock_error)?;

    // Cart
    announce(ctx, session.wizard().step());
    cart::show(&store, ctx)?;
    if !unavailable.is_empty() {
        bail!(messages::STOCK_INSUFFICIENT_SOME);
    }
    advance(ctx, &mut session, store.state())?;

    // Information
    let customer = match &args.customer {
        Some(path) => {
            let raw = std::fs::read_to_string(ctx.resolve_path(Path::new(path)))
                .with_context(|| format!("Failed to read customer file: {}", path))?;
            let form: CustomerForm =
                serde_json::from_str(&raw).context("Failed to parse customer file")?;
            report_fields(ctx, &form.field_errors());
            form
        }
        None => prompt_customer(ctx)?,
    };
    session.wizard_mut().set_customer(customer);
    advance(ctx, &mut session, store.state())?;

    // Delivery
    let delivery = match &args.delivery {
        Some(id) => Some(DeliveryMethodId::new(id.as_str())),
        None if args.yes => None,
        None => prompt_delivery(&session)?,
    };
    if let Some(id) = delivery {
        session.select_delivery(&id).map_err(user_error)?;
    }
    advance(ctx, &mut session, store.state())?;

    // Payment
    let payment = match &args.payment {
        Some(mode) => PaymentMethod::from_mode(mode)
            .ok_or_else(|| anyhow!("Mode de paiement inconnu : {} (stripe, paypal)", mode))?,
        None => prompt_payment()?,
    };
    session.wizard_mut().set_payment_method(payment);

    let amount = session.amount_due(store.state()).map_err(user_error)?;
    if let Some(method) = session.selected_delivery() {
        ctx.output.kv("Livraison", &format!("{} ({})", method.name, method.delivery_estimate()));
    }
    ctx.output.kv("Paiement", payment.display_name());
    ctx.output.kv("Montant à payer", &amount.display());

    loop {
        if !args.yes {
            let go = Confirm::new()
                .with_prompt("Confirmer la commande ?")
                .default(true)
                .interact()?;
            if !go {
                close(&mut session);
                ctx.output.warn("Commande abandonnée");
                return Ok(());
            }
        }

        let spinner = ctx.output.spinner("Envoi de la commande...");
        let provider = ClientSecretPayment::new(|secret: &str, amount: Money| {
            spinner.suspend(|| approve_card(ctx, secret, amount))
        });
        let waited = await_or_abandon(
            session.submit(&mut store, &api, &provider),
            ctrl_c,
            || {
                spinner.suspend(|| -> Result<bool> {
                    Ok(Confirm::new()
                        .with_prompt(messages::ABANDON_ORDER)
                        .default(false)
                        .interact()?)
                })
            },
        )
        .await;
        spinner.finish_and_clear();

        let Some(outcome) = waited? else {
            close(&mut session);
            ctx.output
                .warn("Commande abandonnée : la requête déjà envoyée n'est pas annulée");
            return Ok(());
        };

        match outcome {
            Ok(receipt) => {
                if ctx.output.is_json() {
                    ctx.output.json(&receipt.response);
                    return Ok(());
                }
                if payment == PaymentMethod::Card {
                    ctx.output.success(messages::PAYMENT_SUCCEEDED);
                }
                ctx.output.success(messages::ORDER_PLACED);
                if let Some(id) = &receipt.response.order_id {
                    ctx.output.kv("Commande", id.as_str());
                }
                return Ok(());
            }
            Err(e) => {
                if let Some(notice) = session.wizard().last_error() {
                    ctx.output.notice(notice);
                }
                let retry = !args.yes
                    && Confirm::new()
                        .with_prompt("Réessayer ?")
                        .default(false)
                        .interact()?;
                if !retry {
                    return Err(user_error(e));
                }
            }
        }
    }
}

fn announce(ctx: &Context, step: CheckoutStep) {
    ctx.output.step(step.number(), STEPS, step.display_name());
}

fn advance(
    ctx: &Context,
    session: &mut CheckoutSession,
    cart: &CartState,
) -> Result<()> {
    let Advance { step, warning } = session.wizard_mut().next(cart).map_err(user_error)?;
    if let Some(warning) = warning {
        ctx.output.notice(&warning);
    }
    announce(ctx, step);
    Ok(())
}

/// Leave the wizard once the shopper agreed to.
fn close(session: &mut CheckoutSession) {
    if session.wizard_mut().request_close() == CloseRequest::ConfirmRequired {
        session.wizard_mut().confirm_close();
    }
}

fn report_fields(ctx: &Context, errors: &[FieldError]) {
    for error in errors {
        ctx.output.warn(&format!("{} : {}", error.field, error.message));
    }
}

fn prompt_customer(ctx: &Context) -> Result<CustomerForm> {
    let mut form = CustomerForm::default();
    loop {
        form.full_name = ask("Nom complet", &form.full_name)?;
        form.email = ask("Email", &form.email)?;
        form.phone = ask("Téléphone", &form.phone)?;
        form.address = ask("Adresse", &form.address)?;
        form.postal_code = ask("Code postal", &form.postal_code)?;
        form.city = ask("Ville", &form.city)?;
        let info: String = Input::new()
            .with_prompt("Informations complémentaires")
            .with_initial_text(form.additional_info.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        form.additional_info = Some(info).filter(|i| !i.trim().is_empty());

        let errors = form.field_errors();
        if errors.is_empty() {
            return Ok(form);
        }
        report_fields(ctx, &errors);
    }
}

fn ask(prompt: &str, current: &str) -> Result<String> {
    Ok(Input::new()
        .with_prompt(prompt)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?)
}

fn prompt_delivery(session: &CheckoutSession) -> Result<Option<DeliveryMethodId>> {
    let methods = session.methods();
    if methods.is_empty() {
        return Ok(None);
    }
    let items: Vec<String> = methods
        .iter()
        .map(|m| {
            let price = if m.is_free() { "Gratuit".to_string() } else { m.price.display() };
            format!("{} - {} ({})", m.name, price, m.delivery_estimate())
        })
        .collect();
    let selection = Select::new()
        .with_prompt("Mode de livraison")
        .items(&items)
        .default(0)
        .interact_opt()?;
    Ok(selection.map(|i| methods[i].id.clone()))
}

fn prompt_payment() -> Result<PaymentMethod> {
    let methods = [PaymentMethod::Card, PaymentMethod::Paypal];
    let items: Vec<&str> = methods.iter().map(|m| m.display_name()).collect();
    let selection = Select::new()
        .with_prompt("Mode de paiement")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(methods[selection])
}
