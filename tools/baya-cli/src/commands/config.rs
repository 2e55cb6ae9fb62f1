//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;
    ctx.output.info("[api]");
    ctx.output.kv("base_url", &config.api.base_url);
    ctx.output.kv(
        "admin_token",
        if config.api.admin_token.is_some() { "(set)" } else { "(unset)" },
    );
    if let Some(ms) = config.api.timeout_ms {
        ctx.output.kv("timeout_ms", &ms.to_string());
    }
    if let Some(retries) = config.api.max_retries {
        ctx.output.kv("max_retries", &retries.to_string());
    }
    ctx.output.kv("backoff_base_ms", &config.api.backoff_base_ms.to_string());

    ctx.output.info("[storage]");
    ctx.output.kv(
        "path",
        &ctx.resolve_path(&config.storage.path).display().to_string(),
    );

    ctx.output.info("[cart]");
    ctx.output.kv(
        "discount_retention",
        &format!("{:?}", config.cart.discount_retention),
    );

    ctx.output.info("[checkout]");
    ctx.output.kv(
        "delivery_requirement",
        &format!("{:?}", config.checkout.delivery_requirement),
    );
    if let Some(client) = &config.checkout.client_id {
        ctx.output.kv("client_id", client.as_str());
    }
    for method in &config.checkout.delivery_methods {
        ctx.output.list_item(&format!(
            "{} - {} ({}, {})",
            method.id,
            method.name,
            method.price.display(),
            method.delivery_estimate()
        ));
    }

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.cwd.join(CONFIG_NAMES[0]);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    fs::write(&path, generate_default_config())?;
    ctx.output.success(&format!("Wrote {}", path.display()));
    Ok(())
}
