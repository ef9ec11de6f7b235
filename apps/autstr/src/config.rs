//! # Configuration
//!
//! Optional TOML configuration file for the binary.
//!
//! ```toml
//! [limits]
//! max_states = 200000
//! timeout_ms = 5000
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! max_results = 1000
//! ```
//!
//! Every key is optional. Command-line flags override file values, and file
//! values override the limits stored with the presentation.

use autstr_core::{AutstrError, Limits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "autstr.toml";

/// Upper bound on tuples returned by one evaluation.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

// =============================================================================
// SECTIONS
// =============================================================================

/// `[limits]`: overrides for the presentation's stored limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsSection {
    pub max_states: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl LimitsSection {
    /// Apply the configured values on top of `base`.
    #[must_use]
    pub fn apply(&self, base: Limits) -> Limits {
        Limits {
            max_states: self.max_states.or(base.max_states),
            timeout_ms: self.timeout_ms.or(base.timeout_ms),
        }
    }

    /// Values set here win over values set in `lower`.
    #[must_use]
    pub fn over(self, lower: Self) -> Self {
        Self {
            max_states: self.max_states.or(lower.max_states),
            timeout_ms: self.timeout_ms.or(lower.timeout_ms),
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub max_results: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Contents of `autstr.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub limits: LimitsSection,
    pub server: ServerSection,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicitly given path must exist. Without one, `autstr.toml` in the
    /// working directory is used if present, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AutstrError> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(AutstrError::IoError(format!(
                        "Config file '{}' not found",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(|e| {
                AutstrError::IoError(format!(
                    "Cannot read config '{}': {}",
                    config_path.display(),
                    e
                ))
            })?;
            tracing::debug!(path = %config_path.display(), "configuration loaded");
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self, AutstrError> {
        toml::from_str(text)
            .map_err(|e| AutstrError::SerializationError(format!("Invalid config: {}", e)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.limits, LimitsSection::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::from_toml("[limits]\ntimeout_ms = 250\n").expect("parse");
        assert_eq!(config.limits.timeout_ms, Some(250));
        assert_eq!(config.limits.max_states, None);
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AppConfig::from_toml("[limits]\nmax_state = 1\n").is_err());
    }

    #[test]
    fn test_missing_explicit_config() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/autstr.toml"))).is_err());
    }

    #[test]
    fn test_limits_layering() {
        let base = Limits::default().with_timeout_ms(10);
        let file = LimitsSection {
            max_states: Some(5),
            timeout_ms: None,
        };
        let flags = LimitsSection {
            max_states: None,
            timeout_ms: Some(99),
        };
        let limits = flags.over(file).apply(base);
        assert_eq!(limits.max_states, Some(5));
        assert_eq!(limits.timeout_ms, Some(99));
    }
}
