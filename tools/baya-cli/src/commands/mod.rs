//! CLI command implementations.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;

use anyhow::{anyhow, Result};
use baya_commerce::notice::messages;
use baya_commerce::CommerceError;
use clap::{Args, Subcommand};
use dialoguer::Confirm;
use tracing::debug;

use crate::context::Context;

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart (default).
    Show,
    /// Add a catalog product.
    Add {
        /// Product ID.
        product: String,
        /// Quantity to add.
        #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove a line.
    Remove {
        /// Product ID.
        product: String,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Set a line's quantity.
    Qty {
        /// Product ID.
        product: String,
        /// New quantity.
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Empty the cart.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Apply a promo code.
    Promo {
        /// The code.
        code: String,
    },
    /// Remove the applied promo code.
    Unpromo,
    /// Re-check every line against current stock.
    Check,
}

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List products.
    List {
        /// Search in names and descriptions.
        #[arg(short, long)]
        search: Option<String>,
        /// Restrict to a category ID (repeatable).
        #[arg(short, long)]
        category: Vec<String>,
        /// Minimum price in euros.
        #[arg(long)]
        min: Option<f64>,
        /// Maximum price in euros.
        #[arg(long)]
        max: Option<f64>,
        /// Sort: default, price-asc or price-desc.
        #[arg(long, default_value = "default")]
        sort: String,
        /// Hide products out of stock.
        #[arg(long)]
        in_stock: bool,
    },
    /// List categories.
    Categories,
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Customer details as a JSON file instead of prompts.
    #[arg(long)]
    pub customer: Option<String>,

    /// Delivery method ID.
    #[arg(short, long)]
    pub delivery: Option<String>,

    /// Payment mode: stripe or paypal.
    #[arg(short, long)]
    pub payment: Option<String>,

    /// Skip confirmation prompts. Needs --customer and --payment.
    #[arg(short, long, requires_all = ["customer", "payment"])]
    pub yes: bool,
}

/// Arguments for the admin command.
#[derive(Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Manage products.
    Products {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Manage promo codes.
    Promos {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Follow orders.
    Orders {
        #[command(subcommand)]
        command: OrderCommand,
    },
    /// Sales figures, low stock and latest orders.
    Dashboard {
        /// Year for the monthly sales (defaults to the current year server-side).
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum ResourceCommand {
    /// List rows.
    List,
    /// Create a row from JSON.
    Create {
        /// JSON document, or @path to read it from a file.
        data: String,
    },
    /// Replace a row with JSON.
    Update {
        /// Row ID.
        id: String,
        /// JSON document, or @path to read it from a file.
        data: String,
    },
    /// Delete a row.
    Delete {
        /// Row ID.
        id: String,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum OrderCommand {
    /// List orders.
    List,
    /// Show one order with its lines.
    Show {
        /// Order ID.
        id: String,
    },
    /// Move an order to a new status.
    Status {
        /// Order ID.
        id: String,
        /// pending, processing, shipped, delivered or cancelled.
        status: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Write a default baya.toml in the working directory.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Turn a domain error into the French message the user sees.
pub(crate) fn user_error(e: CommerceError) -> anyhow::Error {
    debug!(error = %e, "command failed");
    anyhow!(e.notice().text)
}

/// Like [`user_error`], naming the stock check when the API could not answer.
pub(crate) fn stock_error(e: CommerceError) -> anyhow::Error {
    match e {
        CommerceError::Upstream(_) => {
            debug!(error = %e, "stock check failed");
            anyhow!("{} ({})", messages::STOCK_CHECK_FAILED, e.notice().text)
        }
        other => user_error(other),
    }
}

/// Ask before a destructive action unless `yes` was given.
pub(crate) fn confirm(ctx: &Context, prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = Confirm::new().with_prompt(prompt).default(false).interact()?;
    if !confirmed {
        ctx.output.warn("Opération annulée");
    }
    Ok(confirmed)
}
