//! Error types for dnswatch
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dnswatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnswatch
#[derive(Error, Debug)]
pub enum Error {
    /// Inventory query errors (provider unreachable, malformed response)
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Errors while writing the hosts table
    #[error("Publish error: {0}")]
    Publish(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from inventory endpoints)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inventory data that cannot be published (e.g. a tag that is not a DNS label)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an inventory error
    pub fn inventory(msg: impl Into<String>) -> Self {
        Self::Inventory(msg.into())
    }

    /// Create a publish error
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error is a configuration problem (fatal at startup)
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
