//! REST plumbing for the BAYA SHOP storefront.
//!
//! [`ApiClient`] implements the commerce crate's stock oracle, promo
//! validator and order gateway over HTTP. Every request is tagged with an
//! [`ApiDependency`] that decides its timeout and retry budget; only
//! idempotent reads are retried.
//!
//! ```no_run
//! use baya_data::{ApiClient, ApiSettings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ApiSettings::default())?;
//! let products = client.list_products().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

pub mod admin;
mod client;
pub mod dashboard;
mod dependency;
mod error;
mod retry;
mod timeout;
mod transport;

pub use admin::{AdminMessages, AdminResource, AdminScreen};
pub use client::{ApiClient, ApiSettings, FetchPolicy};
pub use dashboard::{
    CategoryStat, Dashboard, LowStockItem, MonthlySales, PeriodSales, RecentOrder, SalesSummary,
    TopProduct,
};
pub use dependency::ApiDependency;
pub use error::FetchError;
pub use retry::{BackoffStrategy, RetryCondition, RetryPolicy};
pub use timeout::{with_timeout, TimeoutConfig};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
