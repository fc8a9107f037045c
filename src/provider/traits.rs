//! Liveness provider trait definitions
//!
//! Source-agnostic contract consumed by the supervisor loop.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while checking liveness or resolving a stream URL
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A live source that can be polled for broadcast status
#[async_trait]
pub trait LivenessProvider: Send + Sync {
    /// Display name of the room or channel
    fn live_room_name(&self) -> &str;

    /// Canonical page URL of the source
    fn live_url(&self) -> &str;

    /// Whether the source is broadcasting right now
    async fn is_live(&self) -> Result<bool, ProviderError>;

    /// Current playable stream URL
    async fn resolve_stream_url(&self) -> Result<String, ProviderError>;
}
