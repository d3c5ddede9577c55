//! Error definitions for the mapping module

use thiserror::Error;

/// Errors raised while building a keymap from configuration
#[derive(Debug, Error)]
pub enum MappingError {
    /// A key identifier is empty or otherwise unusable
    #[error("Invalid key for {signal}: {reason}")]
    InvalidKey { signal: String, reason: String },

    /// Configuration value out of range
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
