//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHEETVIEW_*)
//! 2. TOML config file (if SHEETVIEW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHEETVIEW_*)
/// 2. TOML config file (if SHEETVIEW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SHEETVIEW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHEETVIEW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SHEETVIEW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upper bound on a single fetch, in milliseconds.
    ///
    /// Set via SHEETVIEW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects followed per fetch.
    ///
    /// Set via SHEETVIEW_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Cache lifetime in seconds when a request does not set `expire_in`.
    ///
    /// Set via SHEETVIEW_DEFAULT_EXPIRE_SECS environment variable.
    #[serde(default = "default_expire_secs")]
    pub default_expire_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sheetview-cache.sqlite")
}

fn default_user_agent() -> String {
    "sheetview/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_expire_secs() -> u64 {
    600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            default_expire_secs: default_expire_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Default cache lifetime as Duration.
    pub fn default_expire(&self) -> Duration {
        Duration::from_secs(self.default_expire_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var("SHEETVIEW_CONFIG_FILE").ok();
        Self::figment(config_file.as_deref())
            .extract::<Self>()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))
            .and_then(|config| {
                config.validate()?;
                Ok(config)
            })
    }

    fn figment(config_file: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(
            Env::prefixed("SHEETVIEW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./sheetview-cache.sqlite"));
        assert_eq!(config.user_agent, "sheetview/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.default_expire_secs, 600);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.default_expire(), Duration::from_secs(600));
    }

    #[test]
    fn test_toml_and_env_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sheetview.toml", "timeout_ms = 5000\ndefault_expire_secs = 60\n")?;
            jail.set_env("SHEETVIEW_DEFAULT_EXPIRE_SECS", "120");

            let config: AppConfig = AppConfig::figment(Some("sheetview.toml")).extract()?;
            assert_eq!(config.timeout_ms, 5000);
            assert_eq!(config.default_expire_secs, 120);
            assert_eq!(config.user_agent, "sheetview/0.1");
            Ok(())
        });
    }
}
