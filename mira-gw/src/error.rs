//! Error types for mira-gw
//!
//! Defines service-specific error types using thiserror for clear error
//! propagation. Dispatch operations never surface errors to producers; this
//! type covers startup, configuration, and HTTP-layer failures.

use thiserror::Error;

/// Main error type for the mira-gw service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Handshake authentication failure
    #[error("Authentication error: {0}")]
    Auth(#[from] mira_common::auth::AuthError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using mira-gw Error
pub type Result<T> = std::result::Result<T, Error>;
