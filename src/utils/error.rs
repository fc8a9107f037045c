//! Error types and handling
//!
//! Common error types used across the supervisor. Everything a session can fail
//! with ends up as a `SupervisorError`, which the supervisor loop catches at the
//! iteration boundary.

use crate::provider::ProviderError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Liveness provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Panicked: {0}")]
    Panicked(String),
}

impl SupervisorError {
    /// Short machine-readable code, used as a structured log field
    pub fn code(&self) -> &'static str {
        match self {
            SupervisorError::Provider(_) => "PROVIDER_ERROR",
            SupervisorError::Launch { .. } => "LAUNCH_ERROR",
            SupervisorError::Io(_) => "IO_ERROR",
            SupervisorError::Serialization(_) => "SERIALIZATION_ERROR",
            SupervisorError::Config(_) => "CONFIG_ERROR",
            SupervisorError::Panicked(_) => "PANIC",
        }
    }
}

/// Result type alias using SupervisorError
pub type SupervisorResult<T> = Result<T, SupervisorError>;
