//! Error types for the IPv4LL engine
//!
//! This module defines all error types used throughout the crate.
//!
//! Protocol outcomes (conflicts, lost links) are not errors. They travel
//! through the event channel as [`crate::Ipv4llEvent`] values.

use thiserror::Error;

/// Result type alias for IPv4LL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the IPv4LL engine
#[derive(Error, Debug)]
pub enum Error {
    /// Interface index or link address missing at start time
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mutation attempted while the engine is running
    #[error("Busy: {0}")]
    Busy(String),

    /// Operation requires a running engine
    #[error("Engine is not running")]
    NotRunning,

    /// No address has been confirmed by the ACD engine yet
    #[error("Address not available")]
    AddressNotAvailable,

    /// Descriptor and dispatch errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors reported by the ACD engine
    #[error("ACD engine error: {0}")]
    Acd(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a "not configured" error
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a busy error
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Create an ACD engine error
    pub fn acd(msg: impl Into<String>) -> Self {
        Self::Acd(msg.into())
    }
}

/// ACD backends built on anyhow surface as ACD engine errors
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Acd(format!("{err:#}"))
    }
}
