//! Catalog browsing.

use anyhow::{anyhow, Result};
use baya_commerce::catalog::{CatalogQuery, SortOption};
use baya_commerce::Money;

use super::{user_error, CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::output::truncate;

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    let api = ctx.api()?;

    match args.command {
        CatalogCommand::List {
            search,
            category,
            min,
            max,
            sort,
            in_stock,
        } => {
            let sort = SortOption::from_str(&sort)
                .ok_or_else(|| anyhow!("Tri inconnu : {} (default, price-asc, price-desc)", sort))?;
            let mut query = CatalogQuery::new()
                .sort(sort)
                .price_range(min.map(Money::eur), max.map(Money::eur));
            if let Some(text) = search {
                query = query.search(text);
            }
            for id in category {
                query = query.category(id);
            }
            if in_stock {
                query = query.in_stock_only();
            }

            let spinner = ctx.output.spinner("Chargement des produits...");
            let listed = api.list_products().await;
            spinner.finish_and_clear();
            let products = listed.map_err(user_error)?;
            let shown = query.apply(&products);

            if ctx.output.is_json() {
                ctx.output.json(&shown);
                return Ok(());
            }

            ctx.output.header(&format!("Produits ({}) - {}", shown.len(), sort.display_name()));
            let widths = [6, 30, 10, 8, 6];
            ctx.output.table_row(&["ID", "Nom", "Prix", "Promo", "Stock"], &widths);
            for product in shown {
                let id = product.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
                let promo = product
                    .discount_percent()
                    .map(|p| format!("-{}%", p))
                    .unwrap_or_default();
                let stock = if product.is_in_stock() {
                    product.stock.to_string()
                } else {
                    "épuisé".to_string()
                };
                ctx.output.table_row(
                    &[id, &truncate(&product.name, 30), &product.price.display(), &promo, &stock],
                    &widths,
                );
            }
        }
        CatalogCommand::Categories => {
            let spinner = ctx.output.spinner("Chargement des catégories...");
            let listed = api.list_categories().await;
            spinner.finish_and_clear();
            let categories = listed.map_err(user_error)?;

            if ctx.output.is_json() {
                ctx.output.json(&categories);
                return Ok(());
            }

            ctx.output.header("Catégories");
            for category in &categories {
                let id = category.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
                ctx.output.list_item(&format!("{} {}", id, category.name));
            }
        }
    }

    Ok(())
}
