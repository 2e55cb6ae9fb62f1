//! Back-office commands.

use std::path::Path;

use anyhow::{anyhow, Context as _, Result};
use baya_commerce::catalog::{Category, Order, OrderStatus, Product, PromoCode};
use baya_commerce::OrderId;
use baya_data::{
    AdminResource, AdminScreen, ApiClient, CategoryStat, Dashboard, LowStockItem, PeriodSales,
    RecentOrder, TopProduct,
};

use super::{confirm, user_error, AdminArgs, AdminCommand, OrderCommand, ResourceCommand};
use crate::context::Context;
use crate::output::{status_badge, truncate};

/// How one resource is listed.
struct Table<R> {
    title: &'static str,
    columns: &'static [&'static str],
    widths: &'static [usize],
    row: fn(&R) -> Vec<String>,
}

fn id_cell<T: ToString>(id: Option<&T>) -> String {
    id.map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

const PRODUCTS: Table<Product> = Table {
    title: "Produits",
    columns: &["ID", "Nom", "Prix", "Stock", "Catégorie", "Visible"],
    widths: &[6, 28, 10, 6, 9, 7],
    row: |p| {
        vec![
            id_cell(p.id.as_ref()),
            truncate(&p.name, 28),
            p.price.display(),
            p.stock.to_string(),
            id_cell(p.category_id.as_ref()),
            if p.visible { "oui" } else { "non" }.to_string(),
        ]
    },
};

const CATEGORIES: Table<Category> = Table {
    title: "Catégories",
    columns: &["ID", "Nom", "Description"],
    widths: &[6, 24, 40],
    row: |c| {
        vec![
            id_cell(c.id.as_ref()),
            truncate(&c.name, 24),
            truncate(c.description.as_deref().unwrap_or(""), 40),
        ]
    },
};

const PROMOS: Table<PromoCode> = Table {
    title: "Codes promo",
    columns: &["ID", "Code", "Réduction", "Début", "Fin", "Valide"],
    widths: &[6, 14, 9, 10, 10, 6],
    row: |p| {
        let today = chrono::Local::now().date_naive();
        let day = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        vec![
            id_cell(p.id.as_ref()),
            p.code.clone(),
            format!("{}%", p.reduction),
            day(p.starts_on),
            day(p.ends_on),
            if p.is_valid_on(today) { "oui" } else { "non" }.to_string(),
        ]
    },
};

const ORDERS: Table<Order> = Table {
    title: "Commandes",
    columns: &["ID", "Client", "Montant", "Paiement", "Date", "Statut"],
    widths: &[6, 8, 10, 8, 19, 14],
    row: |o| {
        vec![
            id_cell(o.id.as_ref()),
            id_cell(o.client_id.as_ref()),
            o.amount.display(),
            o.payment_mode.clone().unwrap_or_default(),
            truncate(o.placed_at.as_deref().unwrap_or(""), 19),
            status_badge(o.status),
        ]
    },
};

const RECENT_ORDERS: Table<RecentOrder> = Table {
    title: "Commandes récentes",
    columns: &["ID", "Date", "Montant", "Statut"],
    widths: &[6, 10, 10, 14],
    row: |o| {
        vec![
            format!("#{}", id_cell(o.id.as_ref())),
            o.placed_at
                .as_deref()
                .map(|d| d.chars().take(10).collect::<String>())
                .unwrap_or_default(),
            o.amount.display(),
            o.known_status().map(status_badge).unwrap_or_else(|| o.status.clone()),
        ]
    },
};

const LOW_STOCK: Table<LowStockItem> = Table {
    title: "Stock faible",
    columns: &["ID", "Nom", "Restant", "Prix"],
    widths: &[6, 28, 8, 10],
    row: |i| {
        vec![
            id_cell(i.id.as_ref()),
            truncate(&i.name, 28),
            i.quantity.to_string(),
            i.price.display(),
        ]
    },
};

const TOP_PRODUCTS: Table<TopProduct> = Table {
    title: "Meilleures ventes",
    columns: &["ID", "Produit", "Vendus", "Commandes"],
    widths: &[6, 28, 8, 9],
    row: |p| {
        vec![
            id_cell(p.product_id.as_ref()),
            truncate(&p.product_name, 28),
            p.quantity_sold.to_string(),
            p.number_of_orders.to_string(),
        ]
    },
};

const CATEGORY_STATS: Table<CategoryStat> = Table {
    title: "Distribution par catégorie",
    columns: &["Catégorie", "Produits", "Stock"],
    widths: &[24, 8, 8],
    row: |c| {
        vec![
            truncate(&c.category_name, 24),
            c.product_count.to_string(),
            c.total_stock.to_string(),
        ]
    },
};

fn period_table(title: &'static str) -> Table<PeriodSales> {
    Table {
        title,
        columns: &["Période", "Commandes", "Revenu"],
        widths: &[12, 9, 12],
        row: |s| {
            vec![
                truncate(&s.period, 12),
                s.order_count.to_string(),
                s.total_revenue.display(),
            ]
        },
    }
}

/// Run the admin command.
pub async fn run(args: AdminArgs, ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    if ctx.config.api.admin_token.is_none() {
        ctx.output.warn("Aucun admin_token configuré");
    }

    match args.command {
        AdminCommand::Products { command } => resource(command, &PRODUCTS, &api, ctx).await,
        AdminCommand::Categories { command } => resource(command, &CATEGORIES, &api, ctx).await,
        AdminCommand::Promos { command } => resource(command, &PROMOS, &api, ctx).await,
        AdminCommand::Orders { command } => orders(command, &api, ctx).await,
        AdminCommand::Dashboard { year } => dashboard(year, &api, ctx).await,
    }
}

async fn resource<R>(command: ResourceCommand, table: &Table<R>, api: &ApiClient, ctx: &Context) -> Result<()>
where
    R: AdminResource,
    R::Id: From<String>,
{
    let mut screen = AdminScreen::<R>::new(api);

    let notice = match command {
        ResourceCommand::List => {
            load(&mut screen, ctx).await?;
            return list(&screen, table, ctx);
        }
        ResourceCommand::Create { data } => {
            let values: R = parse(&data, ctx)?;
            screen.create(&values).await.map_err(user_error)?
        }
        ResourceCommand::Update { id, data } => {
            let values: R = parse(&data, ctx)?;
            let id: R::Id = id.into();
            screen.update(&id, &values).await.map_err(user_error)?
        }
        ResourceCommand::Delete { id, yes } => {
            let prompt = format!("Êtes-vous sûr de vouloir supprimer cet élément ({}) ?", id);
            if !confirm(ctx, &prompt, yes)? {
                return Ok(());
            }
            let id: R::Id = id.into();
            screen.delete(&id).await.map_err(user_error)?
        }
    };

    ctx.output.notice(&notice);
    if screen.is_loaded() {
        list(&screen, table, ctx)?;
    }
    Ok(())
}

async fn orders(command: OrderCommand, api: &ApiClient, ctx: &Context) -> Result<()> {
    let mut screen = AdminScreen::<Order>::new(api);

    match command {
        OrderCommand::List => {
            load(&mut screen, ctx).await?;
            list(&screen, &ORDERS, ctx)
        }
        OrderCommand::Show { id } => {
            load(&mut screen, ctx).await?;
            let id = OrderId::new(id);
            let order = screen
                .find(&id)
                .ok_or_else(|| anyhow!("Commande introuvable : {}", id))?;
            show_order(order, ctx)
        }
        OrderCommand::Status { id, status } => {
            let status = OrderStatus::from_str(&status)
                .filter(|s| OrderStatus::ADMIN_CHOICES.contains(s))
                .ok_or_else(|| {
                    let choices: Vec<&str> =
                        OrderStatus::ADMIN_CHOICES.iter().map(|s| s.as_str()).collect();
                    anyhow!("Statut inconnu : {} ({})", status, choices.join(", "))
                })?;
            let notice = screen
                .update_status(&OrderId::new(id), status)
                .await
                .map_err(user_error)?;
            ctx.output.notice(&notice);
            Ok(())
        }
    }
}

async fn load<R: AdminResource>(screen: &mut AdminScreen<'_, R>, ctx: &Context) -> Result<()> {
    let spinner = ctx.output.spinner("Chargement...");
    let outcome = screen.load().await.map(|_| ());
    spinner.finish_and_clear();
    outcome.map_err(user_error)
}

fn list<R: AdminResource>(screen: &AdminScreen<'_, R>, table: &Table<R>, ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&screen.rows());
        return Ok(());
    }
    print_table(screen.rows(), table, ctx);
    Ok(())
}

fn print_table<R>(rows: &[R], table: &Table<R>, ctx: &Context) {
    ctx.output.header(&format!("{} ({})", table.title, rows.len()));
    ctx.output.table_row(table.columns, table.widths);
    for row in rows {
        let cells = (table.row)(row);
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        ctx.output.table_row(&cells, table.widths);
    }
}

async fn dashboard(year: Option<i32>, api: &ApiClient, ctx: &Context) -> Result<()> {
    let spinner = ctx.output.spinner("Chargement du tableau de bord...");
    let loaded = api.dashboard(year).await;
    spinner.finish_and_clear();
    let board: Dashboard = loaded.map_err(user_error)?;

    if ctx.output.is_json() {
        ctx.output.json(&board);
        return Ok(());
    }

    let summary = &board.monthly.summary;
    ctx.output.header("Tableau de bord");
    ctx.output.kv("Revenu total", &summary.total_annual_revenue.display());
    ctx.output.kv("Commandes totales", &summary.total_annual_orders.to_string());
    ctx.output.kv("Articles vendus", &summary.total_items_sold.to_string());
    ctx.output.kv("Catégories", &board.categories.len().to_string());
    ctx.output.kv("Stock faible", &board.low_stock.len().to_string());
    if !board.low_stock.is_empty() {
        ctx.output.warn(&format!("{} produit(s) presque épuisé(s)", board.low_stock.len()));
    }

    print_table(&board.recent_orders, &RECENT_ORDERS, ctx);
    print_table(&board.low_stock, &LOW_STOCK, ctx);
    print_table(&board.top_products, &TOP_PRODUCTS, ctx);
    print_table(&board.categories, &CATEGORY_STATS, ctx);
    print_table(&board.monthly.monthly_sales, &period_table("Ventes par mois"), ctx);
    print_table(&board.revenue, &period_table("Revenus"), ctx);
    print_table(&board.trends, &period_table("Tendances des ventes"), ctx);
    Ok(())
}

fn show_order(order: &Order, ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(order);
        return Ok(());
    }
    ctx.output.header(&format!("Commande {}", id_cell(order.id.as_ref())));
    ctx.output.kv("Statut", &status_badge(order.status));
    ctx.output.kv("Montant", &order.amount.display());
    if let Some(code) = order.code_promo.as_deref().filter(|c| !c.is_empty()) {
        ctx.output.kv("Code promo", code);
    }
    if let Some(customer) = order.address().map_err(user_error)? {
        ctx.output.kv("Client", &customer.full_name);
        ctx.output.kv(
            "Adresse",
            &format!("{}, {} {}", customer.address, customer.postal_code, customer.city),
        );
    }
    for line in order.lines().map_err(user_error)? {
        ctx.output
            .list_item(&format!("{} x {} ({})", line.quantity, line.name, line.price.display()));
    }
    Ok(())
}

/// Decode a JSON argument, reading it from a file when it starts with `@`.
fn parse<R: AdminResource>(data: &str, ctx: &Context) -> Result<R> {
    let raw = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(ctx.resolve_path(Path::new(path)))
            .with_context(|| format!("Failed to read {}", path))?,
        None => data.to_string(),
    };
    serde_json::from_str(&raw).context("Invalid JSON document")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_order_row_keeps_unknown_status_text() {
        let order: RecentOrder = serde_json::from_value(serde_json::json!({
            "ID_CMD": 31,
            "Date_cmd": "2024-06-02T10:30:00.000Z",
            "montant": 49.9,
            "statut_CMD": "perdue"
        }))
        .unwrap();

        let row = (RECENT_ORDERS.row)(&order);

        assert_eq!(row, vec!["#31", "2024-06-02", "49.90 \u{20ac}", "perdue"]);
    }

    #[test]
    fn test_period_rows() {
        let sales = PeriodSales {
            period: "Janvier".to_string(),
            total_revenue: baya_commerce::Money::eur(540.5),
            order_count: 12,
        };
        let row = (period_table("Ventes par mois").row)(&sales);
        assert_eq!(row, vec!["Janvier", "12", "540.50 \u{20ac}"]);
    }
}
