//! Named connection configuration.
//!
//! Each configuration group names a driver (`type`) plus the key/value
//! settings that driver needs. Groups are usually read from TOML:
//!
//! ```toml
//! [default]
//! type = "postgresql"
//! table_prefix = ""
//! character_set = "utf8"
//!
//! [default.connection]
//! hostname = "localhost"
//! database = "app"
//! username = "app"
//! password = "secret"
//! ```

use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Settings for one named connection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionConfig {
    /// Driver selector (`postgresql`, or a name given to `Registry::register_driver`).
    #[serde(rename = "type")]
    pub driver: Option<String>,
    /// Driver-specific settings (hostname, database, credentials, ...).
    #[serde(default)]
    pub connection: BTreeMap<String, String>,
    /// Client character set applied after connecting.
    pub character_set: Option<String>,
    /// Whether a persistent link was requested.
    #[serde(default)]
    pub persistent: bool,
    /// Prefix applied to every quoted table name.
    #[serde(default)]
    pub table_prefix: String,
}

impl ConnectionConfig {
    /// Create a configuration for the given driver.
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: Some(driver.into()),
            ..Self::default()
        }
    }

    /// Set one driver setting.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.connection.insert(key.into(), value.into());
        self
    }

    /// Set the client character set.
    pub fn character_set(mut self, charset: impl Into<String>) -> Self {
        self.character_set = Some(charset.into());
        self
    }

    /// Set the table prefix.
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// The driver selector, or a configuration error naming the group.
    pub fn driver_name(&self, name: &str) -> DbResult<&str> {
        self.driver
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                DbError::configuration(format!(
                    "Database type not defined in '{name}' configuration"
                ))
            })
    }

    /// Check that every key in `keys` is present.
    pub fn require(&self, name: &str, keys: &[&str]) -> DbResult<()> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|k| !self.connection.contains_key(*k))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DbError::configuration(format!(
                "Missing required connection keys in '{name}' configuration: {}",
                missing.join(", ")
            )))
        }
    }

    /// Read an optional numeric setting.
    pub fn get_parsed<T: std::str::FromStr>(&self, name: &str, key: &str) -> DbResult<Option<T>> {
        match self.connection.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
                DbError::configuration(format!(
                    "Invalid value '{raw}' for '{key}' in '{name}' configuration"
                ))
            }),
        }
    }

    /// Read an optional duration given in whole seconds.
    pub fn get_seconds(&self, name: &str, key: &str) -> DbResult<Option<Duration>> {
        Ok(self.get_parsed::<u64>(name, key)?.map(Duration::from_secs))
    }
}

/// All configuration groups, keyed by connection name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RegistryConfig {
    pub groups: BTreeMap<String, ConnectionConfig>,
}

impl RegistryConfig {
    /// Parse configuration groups from a TOML document.
    pub fn from_toml(source: &str) -> DbResult<Self> {
        toml::from_str(source).map_err(|e| DbError::configuration(e.to_string()))
    }
}
