//! Storage configuration from the environment.

use std::path::PathBuf;

use crate::selector::{BackendSelector, default_fallback_path};
use crate::storage::StoreError;

pub const DATABASE_URL_VAR: &str = "ORDERCAP_DATABASE_URL";
pub const FALLBACK_PATH_VAR: &str = "ORDERCAP_FALLBACK_PATH";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://orders.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// sqlx SQLite URL of the relational store.
    pub database_url: String,
    /// JSON file used when the relational store is unreachable.
    pub fallback_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            fallback_path: default_fallback_path(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Unset or empty values use the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = value(DATABASE_URL_VAR).unwrap_or_else(|| {
            tracing::warn!("{DATABASE_URL_VAR} not set; using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });

        let fallback_path = value(FALLBACK_PATH_VAR).map(PathBuf::from).unwrap_or_else(|| {
            let path = default_fallback_path();
            tracing::warn!("{FALLBACK_PATH_VAR} not set; using {}", path.display());
            path
        });

        Self {
            database_url,
            fallback_path,
        }
    }

    pub fn selector(&self) -> Result<BackendSelector, StoreError> {
        BackendSelector::new(self.database_url.clone())?.with_fallback_path(self.fallback_path.clone())
    }
}
