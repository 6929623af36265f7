//! Layered configuration: built-in defaults, then `config_equipos.json`
//! (or the file passed with `--config`), then `EQUIPOS_*` environment
//! variables, with `__` separating nested keys.

use crate::error::{BillingError, Result};
use equipos_common::RetryConfig;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config_equipos.json";
pub const ENV_PREFIX: &str = "EQUIPOS_";

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite://equipos.db` or `sqlite::memory:`
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Create the database file when it does not exist
    pub create_if_missing: bool,

    /// How long SQLite waits on a locked database before reporting busy
    pub busy_timeout_ms: u64,

    /// How long to wait for a free pooled connection
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://equipos.db".to_string(),
            max_connections: 5,
            create_if_missing: true,
            busy_timeout_ms: 5000,
            acquire_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Retry policy for quota-style storage errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts including the first one
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            multiplier: defaults.multiplier,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            multiplier: self.multiplier,
            ..RetryConfig::new(
                self.max_attempts,
                Duration::from_millis(self.initial_delay_ms),
            )
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub currency_symbol: String,
    /// Working hours per day used for occupancy
    pub workday_hours: Decimal,
    /// Rows shown by `dashboard` in the recent rentals list
    pub recent_limit: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            currency_symbol: "RD$".to_string(),
            workday_hours: Decimal::from(8),
            recent_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquiposConfig {
    pub database: DatabaseConfig,
    pub retry: RetrySettings,
    pub app: AppSettings,
}

impl EquiposConfig {
    /// Load from `path` (or `config_equipos.json` in the working directory)
    /// and the environment. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::figment(&path)
            .extract::<EquiposConfig>()
            .map_err(|e| BillingError::Configuration {
                message: e.to_string(),
            })?
            .validated()
    }

    fn figment(path: &Path) -> Figment {
        let figment = Figment::from(Serialized::defaults(EquiposConfig::default()));
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let figment = if is_toml {
            figment.merge(Toml::file(path))
        } else {
            figment.merge(Json::file(path))
        };

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(BillingError::Configuration {
                message: "database.url must not be empty".to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(BillingError::Configuration {
                message: "database.max_connections must be at least 1".to_string(),
            });
        }
        if self.app.workday_hours <= Decimal::ZERO {
            return Err(BillingError::Configuration {
                message: "app.workday_hours must be positive".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(BillingError::Configuration {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Defaults rendered as JSON, the format of `config_equipos.json`.
    pub fn generate_example() -> Result<String> {
        Ok(serde_json::to_string_pretty(&Self::default())?)
    }

    /// Defaults rendered as TOML.
    pub fn generate_example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).map_err(|e| BillingError::Configuration {
            message: format!("failed to serialize config: {}", e),
        })
    }
}
