//! CLI configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use baya_commerce::cart::DiscountRetention;
use baya_commerce::checkout::{DeliveryMethod, DeliveryRequirement};
use baya_commerce::ClientId;
use baya_data::{ApiSettings, BackoffStrategy};
use serde::{Deserialize, Serialize};

/// Shop configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    /// REST API configuration.
    #[serde(default)]
    pub api: ApiConfig,

    /// Local cart storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Cart behaviour.
    #[serde(default)]
    pub cart: CartConfig,

    /// Checkout behaviour.
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

impl ShopConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

/// Where the REST API lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL; product photo paths are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for back-office calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,

    /// Overrides the per-endpoint timeouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Overrides the per-endpoint retry counts for reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// First retry delay; doubles on each attempt. Zero disables the delay.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_backoff_base_ms() -> u64 {
    200
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            admin_token: None,
            timeout_ms: None,
            max_retries: None,
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl ApiConfig {
    /// Client settings for this section.
    pub fn settings(&self) -> ApiSettings {
        let backoff = if self.backoff_base_ms == 0 {
            BackoffStrategy::None
        } else {
            BackoffStrategy::Exponential {
                base: Duration::from_millis(self.backoff_base_ms),
                max: Duration::from_secs(2),
            }
        };
        ApiSettings {
            base_url: self.base_url.clone(),
            admin_token: self.admin_token.clone(),
            timeout: self.timeout_ms.map(Duration::from_millis),
            max_retries: self.max_retries,
            backoff,
        }
    }
}

/// Local cart storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the cart snapshot, relative to the working directory.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".baya")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Cart behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartConfig {
    /// What happens to an applied promo code when a line is removed.
    #[serde(default)]
    pub discount_retention: DiscountRetention,
}

/// Checkout behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Whether the Delivery step needs a selected method.
    #[serde(default)]
    pub delivery_requirement: DeliveryRequirement,

    /// Offered delivery methods.
    #[serde(default = "DeliveryMethod::defaults")]
    pub delivery_methods: Vec<DeliveryMethod>,

    /// Signed-in client, recorded on placed orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            delivery_requirement: DeliveryRequirement::default(),
            delivery_methods: DeliveryMethod::defaults(),
            client_id: None,
        }
    }
}

/// Generate a default baya.toml config file.
pub fn generate_default_config() -> String {
    r#"# BAYA SHOP configuration

[api]
base_url = "http://localhost:3000"
# admin_token = "..."
# timeout_ms = 5000
# max_retries = 2
backoff_base_ms = 200

[storage]
path = ".baya"

[cart]
# retain | invalidate_on_removal
discount_retention = "retain"

[checkout]
# advisory | required
delivery_requirement = "advisory"
# client_id = "42"

[[checkout.delivery_methods]]
id = "standard"
name = "Livraison standard"
price = 0.0
estimatedDays = 2

[[checkout.delivery_methods]]
id = "express"
name = "Livraison express"
price = 9.9
estimatedDays = 1
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use baya_commerce::Money;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: ShopConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config, ShopConfig::default());
    }

    #[test]
    fn test_missing_sections_default() {
        let config: ShopConfig = toml::from_str("[api]\nbase_url = \"https://api.baya.fr\"\n").unwrap();
        assert_eq!(config.api.base_url, "https://api.baya.fr");
        assert_eq!(config.api.backoff_base_ms, 200);
        assert_eq!(config.checkout.delivery_methods.len(), 2);
        assert_eq!(config.cart.discount_retention, DiscountRetention::Retain);
    }

    #[test]
    fn test_policies_from_toml() {
        let config: ShopConfig = toml::from_str(
            r#"
[cart]
discount_retention = "invalidate_on_removal"

[checkout]
delivery_requirement = "required"
client_id = "42"

[[checkout.delivery_methods]]
id = "relais"
name = "Point relais"
price = "3.50"
estimatedDays = 3
"#,
        )
        .unwrap();
        assert_eq!(config.cart.discount_retention, DiscountRetention::InvalidateOnRemoval);
        assert_eq!(config.checkout.delivery_requirement, DeliveryRequirement::Required);
        assert_eq!(config.checkout.client_id, Some(ClientId::new("42")));
        assert_eq!(config.checkout.delivery_methods[0].price, Money::eur(3.5));
    }

    #[test]
    fn test_api_settings() {
        let api = ApiConfig {
            timeout_ms: Some(1500),
            backoff_base_ms: 0,
            ..ApiConfig::default()
        };
        let settings = api.settings();
        assert_eq!(settings.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(settings.backoff, BackoffStrategy::None);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baya.json");
        let mut config = ShopConfig::default();
        config.api.admin_token = Some("jeton".to_string());

        config.save(&path).unwrap();

        assert_eq!(ShopConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_save_and_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baya.toml");
        let config = ShopConfig::default();

        config.save(&path).unwrap();

        assert_eq!(ShopConfig::load(&path).unwrap(), config);
    }
}
