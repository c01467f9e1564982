//! Error types for pulsedeck

use thiserror::Error;

/// Errors raised by the fetch layer.
///
/// These never escape a `SourceAdapter`: every variant is absorbed into a
/// fallback-origin snapshot. They are public so gateway implementations and
/// tests can construct and match them. `Clone` lets scripted test gateways
/// replay a stored failure on every call.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network unreachable, connection refused, or request timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response completed with a non-2xx status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Response body was not valid JSON, or lacked the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Errors raised by the AI chat layer
#[derive(Debug, Error)]
pub enum AiError {
    /// The selected backend could not produce a reply
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the preference store
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Preference file could not be read or written
    #[error("Preference file error: {0}")]
    Io(String),

    /// Preference file contents could not be parsed
    #[error("Failed to parse preferences: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for AI chat operations
pub type AiResult<T> = std::result::Result<T, AiError>;
