//! Dashboard configuration.
//!
//! Stored as TOML. Every field has a default, so a missing file or a partial
//! file is fine. Lookup order: an explicit path, then
//! `<config dir>/breadthview/config.toml`, then built-in defaults.

use crate::indicators::IndicatorParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const API_URL_ENV: &str = "BREADTHVIEW_API_URL";

/// Upper bound for `initial_window_days` (about a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// An index the dashboard can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexChoice {
    pub symbol: String,
    pub name: String,
}

impl IndexChoice {
    fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub default_index: String,
    pub indices: Vec<IndexChoice>,
    pub initial_window_days: i64,
    pub backfill_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub indicators: IndicatorParams,
    pub display_utc_offset_hours: i64,
    pub require_email: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".into(),
            default_index: "HK.800000".into(),
            indices: vec![
                IndexChoice::new("HK.800000", "Hang Seng Index"),
                IndexChoice::new("HK.800700", "Hang Seng TECH Index"),
            ],
            initial_window_days: 365,
            backfill_debounce_ms: 1000,
            request_timeout_secs: 30,
            max_retries: 2,
            indicators: IndicatorParams::default(),
            display_utc_offset_hours: 8,
            require_email: true,
        }
    }
}

impl DashboardConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("breadthview").join("config.toml"))
    }

    /// Resolve the config: `explicit` if given (must exist), else the default
    /// path if it exists, else defaults. The API URL environment variable
    /// overrides whatever was loaded.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "loading config");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url;
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate().map_err(ConfigError::Invalid)?;
        if !(1..=MAX_WINDOW_DAYS).contains(&self.initial_window_days) {
            return Err(ConfigError::Invalid(format!(
                "initial_window_days must be within 1..={MAX_WINDOW_DAYS}"
            )));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!("max_retries must be <= {MAX_RETRIES}")));
        }
        if self.indices.is_empty() {
            return Err(ConfigError::Invalid("at least one index is required".into()));
        }
        if !(-14..=14).contains(&self.display_utc_offset_hours) {
            return Err(ConfigError::Invalid(
                "display_utc_offset_hours must be within -14..=14".into(),
            ));
        }
        Ok(())
    }

    pub fn backfill_debounce(&self) -> Duration {
        Duration::from_millis(self.backfill_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Display name for `symbol`, falling back to the symbol itself.
    pub fn index_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.indices
            .iter()
            .find(|c| c.symbol == symbol)
            .map(|c| c.name.as_str())
            .unwrap_or(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = DashboardConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.index_name("HK.800700"), "Hang Seng TECH Index");
        assert_eq!(cfg.index_name("HK.999999"), "HK.999999");
        assert_eq!(cfg.backfill_debounce(), Duration::from_secs(1));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = DashboardConfig::from_toml(
            r#"
            api_base_url = "http://example.test:8080"
            require_email = false

            [indicators]
            ma_periods = [20, 60]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api_base_url, "http://example.test:8080");
        assert!(!cfg.require_email);
        assert_eq!(cfg.indicators.ma_periods, vec![20, 60]);
        assert_eq!(cfg.indicators.breadth_period, 50);
        assert_eq!(cfg.initial_window_days, 365);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            DashboardConfig::from_toml("[indicators]\nma_periods = [0]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml("initial_window_days = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml("max_retries = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn out_of_range_bounds_rejected() {
        assert!(matches!(
            DashboardConfig::from_toml("initial_window_days = 200000000"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml("max_retries = 40"),
            Err(ConfigError::Invalid(_))
        ));
        let cfg = DashboardConfig::from_toml("initial_window_days = 36500\nmax_retries = 10").unwrap();
        assert_eq!(cfg.initial_window_days, MAX_WINDOW_DAYS);
        assert_eq!(cfg.max_retries, MAX_RETRIES);
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "initial_window_days = 730\nrequire_email = false\n\n[indicators]\nma_periods = [10, 30]\n",
        )
        .unwrap();

        let cfg = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.initial_window_days, 730);
        assert!(!cfg.require_email);
        assert_eq!(cfg.indicators.ma_periods, vec![10, 30]);
        assert_eq!(cfg.default_index, "HK.800000");
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        match DashboardConfig::load(Some(&path)) {
            Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a read error, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "indices = []\n").unwrap();
        assert!(matches!(
            DashboardConfig::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    // The only test that touches the API URL variable.
    #[test]
    fn env_overrides_api_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"http://from-file.test\"\n").unwrap();

        std::env::set_var(API_URL_ENV, "http://from-env.test");
        let overridden = DashboardConfig::load(Some(&path));
        std::env::set_var(API_URL_ENV, "  ");
        let blank = DashboardConfig::load(Some(&path));
        std::env::remove_var(API_URL_ENV);

        assert_eq!(overridden.unwrap().api_base_url, "http://from-env.test");
        assert_eq!(blank.unwrap().api_base_url, "http://from-file.test");
    }

    #[test]
    fn indices_from_toml() {
        let cfg = DashboardConfig::from_toml(
            r#"
            default_index = "HK.800700"

            [[indices]]
            symbol = "HK.800700"
            name = "Hang Seng TECH Index"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.indices.len(), 1);
        assert_eq!(cfg.default_index, "HK.800700");
    }
}
