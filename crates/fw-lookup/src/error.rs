//! Error taxonomy for external lookups.

use thiserror::Error;

/// Errors produced while talking to geo providers or the whois service.
///
/// These never escape an enrichment pass: callers collapse them into the
/// `Unknown` sentinel per provider. The variants exist so retry logic can
/// see what went wrong and logs stay diagnosable.
#[derive(Error, Debug, Clone)]
pub enum LookupError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;
