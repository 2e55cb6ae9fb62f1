//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use baya_commerce::cart::CartStore;
use baya_commerce::checkout::CheckoutSession;
use baya_data::ApiClient;
use baya_store::FileStore;
use tracing::{debug, warn};

use crate::config::ShopConfig;
use crate::output::Output;

/// File names searched for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["baya.toml", ".baya.toml", "baya.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Shop configuration.
    pub config: ShopConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, path);
                (ShopConfig::load(&path)?, Some(path))
            }
            None => match find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (ShopConfig::default(), None),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// API client for the configured base URL.
    pub fn api(&self) -> Result<ApiClient> {
        ApiClient::new(self.config.api.settings()).context("Failed to create API client")
    }

    /// The cart store, rehydrated from the snapshot on disk.
    pub fn open_cart(&self) -> Result<CartStore<FileStore>> {
        let root = self.resolve_path(&self.config.storage.path);
        let storage = FileStore::open(&root)
            .with_context(|| format!("Failed to open cart storage: {}", root.display()))?;
        Ok(CartStore::load(storage).with_retention(self.config.cart.discount_retention))
    }

    /// A fresh checkout session with the configured delivery policy.
    pub fn checkout_session(&self) -> CheckoutSession {
        let checkout = &self.config.checkout;
        CheckoutSession::new(checkout.delivery_methods.clone(), checkout.delivery_requirement)
            .with_client(checkout.client_id.clone())
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Find a config file in `start` or one of its parents.
pub fn find_config(start: &Path) -> Option<(ShopConfig, PathBuf)> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let candidate = current.join(name);
            if candidate.exists() {
                match ShopConfig::load(&candidate) {
                    Ok(config) => {
                        debug!(path = %candidate.display(), "loaded config");
                        return Some((config, candidate));
                    }
                    Err(e) => warn!(path = %candidate.display(), error = %e, "skipping unreadable config"),
                }
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_searches_parents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("baya.toml"),
            "[api]\nbase_url = \"https://api.baya.fr\"\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = find_config(&nested).unwrap();

        assert_eq!(config.api.base_url, "https://api.baya.fr");
        assert_eq!(path, dir.path().join("baya.toml"));
    }

    #[test]
    fn test_find_config_skips_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("baya.toml"), "[api\n").unwrap();
        std::fs::write(dir.path().join("baya.json"), r#"{"storage":{"path":"/tmp/panier"}}"#).unwrap();

        let (config, _) = find_config(dir.path()).unwrap();

        assert_eq!(config.storage.path, PathBuf::from("/tmp/panier"));
    }
}
