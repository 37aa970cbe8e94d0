//! Propagated error types.
//!
//! The cache itself never fails a request: consistency anomalies are
//! logged and self-healed, and capacity refusal is a boolean. Only
//! configuration loading produces a real error.

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config: {message}")]
    Parse { message: String },
}
