//! Error types for patlite
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PatliteError
pub type Result<T> = std::result::Result<T, PatliteError>;

/// Unified error type for signal-tower operations
///
/// A negative acknowledgment from the device is not an error: it comes
/// back as a successfully parsed response whose `is_negative_ack()` is true.
#[derive(Debug, Error)]
pub enum PatliteError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    #[error("Port out of range: {0} (expected 0-65535)")]
    InvalidPort(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Not connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Command {command} expects a {expected} payload, got {actual}")]
    CommandMismatch {
        command: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

impl PatliteError {
    /// True for errors raised while validating connection parameters
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PatliteError::InvalidAddress(_) | PatliteError::InvalidPort(_) | PatliteError::Config(_)
        )
    }
}
