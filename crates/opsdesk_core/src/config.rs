//! Dashboard configuration loaded from TOML.
//!
//! # Invariants
//! - A missing config file yields defaults; a malformed one is an error.
//! - Loaded configs are validated before they are returned.

use crate::hydrate::DEFAULT_UNKNOWN_LABEL;
use crate::listing::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "OPSDESK_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "opsdesk.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// SQLite snapshot file used by the CLI.
    pub database_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub page_size: u32,
    /// Label shown for references that cannot be resolved.
    pub unknown_label: String,
    /// Base URL of the service exposing `/api/payments`.
    pub payments_base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("opsdesk.db"),
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
            unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(),
            payments_base_url: None,
            request_timeout_secs: 10,
        }
    }
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be within 1..={MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.unknown_label.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "unknown_label cannot be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if let Some(url) = &self.payments_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "payments_base_url must be an http(s) URL, got `{url}`"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Config location: `OPSDESK_CONFIG_PATH`, else `opsdesk.toml` in the
/// working directory.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Loads and validates the config at `path`; a missing file yields defaults.
pub fn load_config(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(DashboardConfig::default())
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str) -> Result<DashboardConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::{parse_config, DashboardConfig};

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config("page_size = 25\nunknown_label = \"N/A\"").unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.unknown_label, "N/A");
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let config = DashboardConfig {
            page_size: 0,
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            payments_base_url: Some("ftp://payments".to_string()),
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
