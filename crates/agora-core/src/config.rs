//! Cache configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Configuration for the forum query cache. All fields are optional;
/// the `effective_*` accessors supply the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of distinct messages held by the message pool.
    /// Default: 2500 (roughly 40 MB at maximal message sizes).
    pub max_cached_messages: Option<usize>,
    /// Minimum interval between successive clean-up attempts, millis.
    /// Default: 5000.
    pub min_cleanup_interval_ms: Option<u64>,
    /// Idle time after which a cached query becomes an eviction
    /// candidate, millis. Default: 30 minutes.
    pub idle_timeout_ms: Option<u64>,
    /// Minimum usage frequency (uses per hour since creation) below
    /// which an idle query is considered low priority. Default: 0.5.
    pub min_uses_per_hour: Option<f64>,
}

impl CacheConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded cache configuration");
        Ok(config)
    }

    /// Returns the effective message-pool capacity, defaulting to 2500.
    pub fn effective_max_cached_messages(&self) -> usize {
        self.max_cached_messages.unwrap_or(2500)
    }

    /// Returns the effective clean-up throttle, defaulting to 5 s.
    pub fn effective_min_cleanup_interval_ms(&self) -> u64 {
        self.min_cleanup_interval_ms.unwrap_or(5_000)
    }

    /// Returns the effective idle timeout, defaulting to 30 minutes.
    pub fn effective_idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_ms.unwrap_or(30 * 60 * 1000)
    }

    /// Returns the effective minimum usage frequency, defaulting to 0.5
    /// uses per hour (12 uses per 24 hours).
    pub fn effective_min_uses_per_hour(&self) -> f64 {
        self.min_uses_per_hour.unwrap_or(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = CacheConfig::default();
        assert_eq!(config.effective_max_cached_messages(), 2500);
        assert_eq!(config.effective_min_cleanup_interval_ms(), 5_000);
        assert_eq!(config.effective_idle_timeout_ms(), 30 * 60 * 1000);
        assert_eq!(config.effective_min_uses_per_hour(), 0.5);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = CacheConfig::from_toml_str(
            "max_cached_messages = 10\nidle_timeout_ms = 0\n",
        )
        .unwrap();
        assert_eq!(config.effective_max_cached_messages(), 10);
        assert_eq!(config.effective_idle_timeout_ms(), 0);
        assert_eq!(config.effective_min_cleanup_interval_ms(), 5_000);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(CacheConfig::from_toml_str("max_cached_messages = [").is_err());
    }
}
