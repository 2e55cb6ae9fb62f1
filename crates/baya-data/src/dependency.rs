//! Endpoint tagging for the REST API.

use std::time::Duration;

/// The API surfaces the storefront calls.
///
/// Each tag carries default timeouts and retry counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiDependency {
    /// `/articles` and `/categories` listings.
    Catalog,
    /// Stock checks.
    Inventory,
    /// Promo-code validation.
    Promo,
    /// Order placement.
    Orders,
    /// Payment intents.
    Payments,
    /// Back-office CRUD.
    Admin,
}

impl ApiDependency {
    /// Get the default timeout for this dependency type.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Catalog => Duration::from_secs(5),
            Self::Inventory => Duration::from_secs(3),
            Self::Promo => Duration::from_secs(5),
            Self::Orders | Self::Payments => Duration::from_secs(15),
            Self::Admin => Duration::from_secs(10),
        }
    }

    /// Get the default max retries for this dependency type.
    ///
    /// Only idempotent reads are ever retried; see [`crate::FetchPolicy::for_method`].
    pub fn default_max_retries(&self) -> u32 {
        match self {
            Self::Catalog | Self::Inventory => 2,
            Self::Admin => 1,
            Self::Promo | Self::Orders | Self::Payments => 0,
        }
    }

    /// Get the name of this dependency.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Inventory => "inventory",
            Self::Promo => "promo",
            Self::Orders => "orders",
            Self::Payments => "payments",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ApiDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
