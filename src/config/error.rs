//! Error types and result aliases.
//!
//! Defines the core `SessionError` enumeration and common `Result` type.

use thiserror::Error;

/// Session middleware errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The Fernet key is not 32 url-safe base64-encoded bytes.
    #[error("invalid fernet key: {0}")]
    InvalidKey(String),

    /// Token is malformed, tampered with, or signed with another key.
    #[error("invalid token")]
    InvalidToken,

    /// Token is older than the allowed TTL.
    #[error("token expired")]
    TokenExpired,

    /// Session payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Set-Cookie value is not a valid header value.
    #[error("invalid header value: {0}")]
    Header(#[from] http::header::InvalidHeaderValue),

    /// Socket or listener error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for `SessionError`.
pub type Result<T> = std::result::Result<T, SessionError>;
