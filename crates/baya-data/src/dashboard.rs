//! Back-office dashboard figures.
//!
//! Read-only aggregates served under `/dashboard`. Sums computed by the
//! database often arrive quoted, so every amount and count is read loosely.

use baya_commerce::catalog::OrderStatus;
use baya_commerce::wire::{decimal_money, loose_u32};
use baya_commerce::{CommerceError, Money, OrderId, ProductId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ApiClient;
use crate::dependency::ApiDependency;
use crate::error::FetchError;

const LOAD_FAILED: &str = "Erreur lors du chargement du tableau de bord";

/// Sales over one period (day, week or month, as the API buckets them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSales {
    #[serde(default, alias = "month_name", alias = "month", alias = "date")]
    pub period: String,
    #[serde(default, alias = "total_sales", alias = "revenue", with = "decimal_money")]
    pub total_revenue: Money,
    #[serde(default, alias = "total_orders", with = "loose_u32")]
    pub order_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    #[serde(default, alias = "ID_ART")]
    pub product_id: Option<ProductId>,
    #[serde(default, alias = "Nom")]
    pub product_name: String,
    #[serde(default, alias = "total_sold", with = "loose_u32")]
    pub quantity_sold: u32,
    #[serde(default, with = "loose_u32")]
    pub number_of_orders: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    #[serde(default)]
    pub category_name: String,
    #[serde(default, with = "loose_u32")]
    pub product_count: u32,
    #[serde(default, with = "loose_u32")]
    pub total_stock: u32,
}

/// A product running out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockItem {
    #[serde(rename = "ID_ART", default)]
    pub id: Option<ProductId>,
    #[serde(rename = "Nom", default)]
    pub name: String,
    #[serde(rename = "Quantite", default, with = "loose_u32")]
    pub quantity: u32,
    #[serde(rename = "Prix", default, with = "decimal_money")]
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentOrder {
    #[serde(rename = "ID_CMD", default)]
    pub id: Option<OrderId>,
    #[serde(rename = "Date_cmd", default)]
    pub placed_at: Option<String>,
    #[serde(rename = "montant", default, with = "decimal_money")]
    pub amount: Money,
    /// Raw status text; older rows carry French labels.
    #[serde(rename = "statut_CMD", default)]
    pub status: String,
}

impl RecentOrder {
    pub fn known_status(&self) -> Option<OrderStatus> {
        OrderStatus::from_str(&self.status).or_else(|| {
            match self.status.trim().to_lowercase().as_str() {
                "completed" | "terminée" => Some(OrderStatus::Delivered),
                "en attente" => Some(OrderStatus::Pending),
                "annulée" => Some(OrderStatus::Cancelled),
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    #[serde(default, with = "decimal_money")]
    pub total_annual_revenue: Money,
    #[serde(default, with = "loose_u32")]
    pub total_annual_orders: u32,
    #[serde(default, with = "loose_u32")]
    pub total_items_sold: u32,
}

/// `/dashboard/sales-by-month` answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySales {
    #[serde(default)]
    pub monthly_sales: Vec<PeriodSales>,
    #[serde(default)]
    pub summary: SalesSummary,
}

/// Everything the dashboard screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub revenue: Vec<PeriodSales>,
    pub top_products: Vec<TopProduct>,
    pub categories: Vec<CategoryStat>,
    pub low_stock: Vec<LowStockItem>,
    pub recent_orders: Vec<RecentOrder>,
    pub trends: Vec<PeriodSales>,
    pub monthly: MonthlySales,
}

fn failed(e: FetchError) -> CommerceError {
    CommerceError::AdminFailed {
        message: LOAD_FAILED,
        detail: e.to_string(),
    }
}

impl ApiClient {
    async fn dashboard_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CommerceError> {
        self.get_json(&format!("/dashboard/{}", path), ApiDependency::Admin)
            .await
            .map_err(failed)
    }

    pub async fn revenue_stats(&self) -> Result<Vec<PeriodSales>, CommerceError> {
        self.dashboard_json("revenue-stats").await
    }

    pub async fn top_products(&self) -> Result<Vec<TopProduct>, CommerceError> {
        self.dashboard_json("top-products").await
    }

    pub async fn category_stats(&self) -> Result<Vec<CategoryStat>, CommerceError> {
        self.dashboard_json("category-stats").await
    }

    pub async fn low_stock(&self) -> Result<Vec<LowStockItem>, CommerceError> {
        self.dashboard_json("low-stock").await
    }

    pub async fn recent_orders(&self) -> Result<Vec<RecentOrder>, CommerceError> {
        self.dashboard_json("recent-orders").await
    }

    pub async fn sales_trends(&self) -> Result<Vec<PeriodSales>, CommerceError> {
        self.dashboard_json("sales-trends").await
    }

    /// Monthly sales for `year`, or the server's current year.
    pub async fn sales_by_month(&self, year: Option<i32>) -> Result<MonthlySales, CommerceError> {
        match year {
            Some(year) => self.dashboard_json(&format!("sales-by-month?year={}", year)).await,
            None => self.dashboard_json("sales-by-month").await,
        }
    }

    /// Fetch every dashboard section at once. Any failing section fails the load.
    pub async fn dashboard(&self, year: Option<i32>) -> Result<Dashboard, CommerceError> {
        let (revenue, top_products, categories, low_stock, recent_orders, trends, monthly) =
            tokio::try_join!(
                self.revenue_stats(),
                self.top_products(),
                self.category_stats(),
                self.low_stock(),
                self.recent_orders(),
                self.sales_trends(),
                self.sales_by_month(year),
            )?;
        debug!(
            low_stock = low_stock.len(),
            recent_orders = recent_orders.len(),
            "dashboard loaded"
        );
        Ok(Dashboard {
            revenue,
            top_products,
            categories,
            low_stock,
            recent_orders,
            trends,
            monthly,
        })
    }
}
