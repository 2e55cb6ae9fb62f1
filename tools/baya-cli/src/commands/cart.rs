//! Cart commands.

use anyhow::{anyhow, Result};
use baya_commerce::cart::{apply_promo_code, CartStore};
use baya_commerce::notice::messages;
use baya_commerce::{CommerceError, Notice, NoticeBoard, ProductId};
use baya_store::KvStore;

use super::{confirm, stock_error, user_error, CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let mut cart = ctx.open_cart()?;

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => {}
        CartCommand::Add { product, qty } => add(&mut cart, &product, qty, ctx).await?,
        CartCommand::Remove { product, yes } => {
            let id = ProductId::new(product);
            let Some(item) = cart.item(&id) else {
                return Err(user_error(CommerceError::ItemNotInCart(id.to_string())));
            };
            let prompt = format!("{} ({})", messages::CONFIRM_REMOVE, item.name);
            if !confirm(ctx, &prompt, yes)? {
                return Ok(());
            }
            let had_discount = cart.discount().is_some();
            cart.remove_item(&id).map_err(user_error)?;
            ctx.output.success(messages::ITEM_REMOVED);
            if had_discount && cart.discount().is_none() {
                ctx.output.warn(messages::PROMO_INVALIDATED);
            }
        }
        CartCommand::Qty { product, qty } => {
            let api = ctx.api()?;
            let id = ProductId::new(product);
            let spinner = ctx.output.spinner("Vérification du stock...");
            let outcome = cart.update_checked(&api, &id, qty).await;
            spinner.finish_and_clear();
            outcome.map_err(stock_error)?;
            ctx.output.success("Quantité mise à jour");
        }
        CartCommand::Clear { yes } => {
            if cart.is_empty() {
                ctx.output.info(messages::EMPTY_CART);
                return Ok(());
            }
            if !confirm(ctx, messages::CONFIRM_CLEAR, yes)? {
                return Ok(());
            }
            cart.clear().map_err(user_error)?;
            ctx.output.success(messages::CART_CLEARED);
        }
        CartCommand::Promo { code } => {
            let api = ctx.api()?;
            let spinner = ctx.output.spinner("Validation du code promo...");
            let outcome = apply_promo_code(&mut cart, &api, &code).await;
            spinner.finish_and_clear();
            let discount = outcome.map_err(user_error)?;
            ctx.output.success(messages::PROMO_APPLIED);
            ctx.output.kv("Réduction", &format!("{}%", discount.percentage));
        }
        CartCommand::Unpromo => {
            if cart.remove_discount().map_err(user_error)? {
                ctx.output.success(messages::PROMO_REMOVED);
            } else {
                ctx.output.info("Aucun code promo appliqué");
            }
        }
        CartCommand::Check => {
            let api = ctx.api()?;
            let spinner = ctx.output.spinner("Vérification du stock...");
            let outcome = cart.refresh_stock(&api).await;
            spinner.finish_and_clear();
            let unavailable = outcome.map_err(stock_error)?;
            if unavailable.is_empty() {
                ctx.output.success("Tous les articles sont disponibles");
            }
        }
    }

    show(&cart, ctx)
}

async fn add<S: KvStore>(cart: &mut CartStore<S>, product: &str, qty: i64, ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let spinner = ctx.output.spinner("Chargement du produit...");
    let listed = api.list_products().await;
    spinner.finish_and_clear();

    let products = listed.map_err(user_error)?;
    let id = ProductId::new(product);
    let found = products
        .iter()
        .find(|p| p.id.as_ref() == Some(&id) && p.visible)
        .ok_or_else(|| anyhow!("Produit introuvable : {}", id))?;
    let line = found.to_cart_product(api.base_url()).map_err(user_error)?;

    let spinner = ctx.output.spinner("Vérification du stock...");
    let outcome = cart.add_checked(&api, line, qty).await;
    spinner.finish_and_clear();
    outcome.map_err(stock_error)?;

    ctx.output.success(messages::ADDED_TO_CART);
    Ok(())
}

/// Print the cart with totals and stock warnings.
pub(crate) fn show<S: KvStore>(cart: &CartStore<S>, ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(cart.state());
        return Ok(());
    }

    ctx.output.header("Panier");
    if cart.is_empty() {
        ctx.output.info(messages::EMPTY_CART);
        return Ok(());
    }

    let widths = [8, 28, 5, 10, 10];
    ctx.output.table_row(&["ID", "Article", "Qté", "Prix", "Total"], &widths);

    let mut notices = NoticeBoard::new();
    for item in cart.items() {
        let line_total = item.line_total().map_err(user_error)?;
        ctx.output.table_row(
            &[
                item.id.as_str(),
                &crate::output::truncate(&item.name, 28),
                &item.quantity.to_string(),
                &item.unit_price.display(),
                &line_total.display(),
            ],
            &widths,
        );
        if let Some(status) = cart.stock_status(&item.id).filter(|s| !s.is_available) {
            notices.push_once(Notice::warning(messages::STOCK_INSUFFICIENT_SOME));
            ctx.output.list_item(&format!("{} : {}", item.name, status.refusal_message()));
        }
    }

    println!();
    if let Some(discount) = cart.discount() {
        ctx.output.kv("Sous-total", &cart.original_total().display());
        let code = discount.code.as_deref().unwrap_or("-");
        ctx.output.kv(
            &format!("Réduction {} ({}%)", code, discount.percentage),
            &format!("-{}", discount.amount.display()),
        );
    }
    ctx.output.kv("Articles", &cart.item_count().to_string());
    ctx.output.kv("Total", &cart.total().display());

    for notice in notices.drain() {
        ctx.output.notice(&notice);
    }
    Ok(())
}
