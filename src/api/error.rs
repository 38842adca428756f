//! API Error Types
//!
//! Errors surfaced while binding and running the HTTP server. Relay-side
//! failures never reach this layer: a send to a dead peer is swallowed at
//! the hub, and a malformed frame is answered on the socket itself.

use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// IO error (e.g. failure to bind the listen address)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
