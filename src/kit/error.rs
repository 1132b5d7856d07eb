//! Sync error taxonomy
//!
//! Lower-level resolvers return these rather than panicking; the
//! orchestrator propagates the first fatal error with the provider's
//! status preserved.

use thiserror::Error;

/// Errors produced by the Kit adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Bad caller input (empty name, invalid email). Never reaches the network.
    #[error("{0}")]
    InvalidInput(String),

    /// The account has no Kit API key. Never reaches the network.
    #[error("Missing Kit API Key. Add it in Settings.")]
    MissingCredential,

    /// The provider responded, but unsuccessfully or in an unexpected shape.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Transport-level failure with no response.
    #[error("Network error: {0}")]
    Network(String),

    /// The client-enforced request deadline was exceeded.
    #[error("The request to Kit timed out.")]
    Timeout,
}

impl SyncError {
    /// HTTP status code this error maps to at the API boundary.
    ///
    /// Upstream statuses are preserved when they are valid HTTP codes,
    /// defaulting to 500 otherwise.
    pub fn http_status(&self) -> u16 {
        match self {
            SyncError::InvalidInput(_) | SyncError::MissingCredential => 400,
            SyncError::Upstream { status, .. } => {
                if (100..=599).contains(status) {
                    *status
                } else {
                    500
                }
            }
            SyncError::Network(_) => 500,
            SyncError::Timeout => 504,
        }
    }

    /// Map a reqwest transport error, distinguishing timeouts.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SyncError::Timeout
        } else {
            SyncError::Network(error.to_string())
        }
    }

    /// Build an upstream error, defaulting a zero/invalid status to 500.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        let status = if (100..=599).contains(&status) {
            status
        } else {
            500
        };
        SyncError::Upstream {
            status,
            message: message.into(),
        }
    }
}
