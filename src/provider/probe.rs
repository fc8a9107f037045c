//! FFprobe-based liveness provider
//!
//! Treats a fixed stream URL as live whenever a probe of it succeeds.

use super::traits::{LivenessProvider, ProviderError};
use crate::supervisor::config::SourceConfig;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Liveness provider for a source with a stable stream URL
#[derive(Debug, Clone)]
pub struct ProbeProvider {
    live_room_name: String,
    live_url: String,
    stream_url: String,
    probe: String,
    probe_timeout: Duration,
}

impl ProbeProvider {
    /// Build a provider from the `source` block of the configuration
    pub fn from_config(source: &SourceConfig) -> Self {
        Self {
            live_room_name: source.live_room_name.clone(),
            live_url: source.live_url.clone(),
            stream_url: source.stream_url.clone(),
            probe: source.probe.clone(),
            probe_timeout: Duration::from_millis(source.probe_timeout_ms),
        }
    }

    /// Arguments handed to the probe program
    fn probe_args(&self) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=format_name".to_string(),
            "-of".to_string(),
            "csv=p=0".to_string(),
            self.stream_url.clone(),
        ]
    }
}

#[async_trait]
impl LivenessProvider for ProbeProvider {
    fn live_room_name(&self) -> &str {
        &self.live_room_name
    }

    fn live_url(&self) -> &str {
        &self.live_url
    }

    async fn is_live(&self) -> Result<bool, ProviderError> {
        let probe = Command::new(&self.probe)
            .args(self.probe_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.probe_timeout, probe).await {
            Ok(result) => result
                .map_err(|e| ProviderError::Probe(format!("Failed to run {}: {}", self.probe, e)))?,
            Err(_) => {
                tracing::debug!(
                    "Probe of {} timed out after {:?}",
                    self.stream_url,
                    self.probe_timeout
                );
                return Ok(false);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!("Probe reports offline: {}", stderr.trim());
        }

        Ok(output.status.success())
    }

    async fn resolve_stream_url(&self) -> Result<String, ProviderError> {
        if self.stream_url.is_empty() {
            return Err(ProviderError::Parse("No stream URL configured".to_string()));
        }
        Ok(self.stream_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(probe: &str) -> SourceConfig {
        SourceConfig {
            live_room_name: "Test Room".to_string(),
            live_url: "http://example.com/room/".to_string(),
            stream_url: "rtmp://x/y".to_string(),
            probe: probe.to_string(),
            probe_timeout_ms: 2_000,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_probe_is_live() {
        let provider = ProbeProvider::from_config(&source("true"));
        assert!(provider.is_live().await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_probe_is_offline() {
        let provider = ProbeProvider::from_config(&source("false"));
        assert!(!provider.is_live().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_probe_is_error() {
        let provider = ProbeProvider::from_config(&source("/nonexistent/ffprobe-missing"));
        assert!(matches!(provider.is_live().await, Err(ProviderError::Probe(_))));
    }

    #[tokio::test]
    async fn test_resolve_returns_configured_url() {
        let provider = ProbeProvider::from_config(&source("true"));
        assert_eq!(provider.resolve_stream_url().await.unwrap(), "rtmp://x/y");
        assert_eq!(provider.live_room_name(), "Test Room");
    }

    #[tokio::test]
    async fn test_resolve_without_url_fails() {
        let mut config = source("true");
        config.stream_url.clear();
        let provider = ProbeProvider::from_config(&config);
        assert!(provider.resolve_stream_url().await.is_err());
    }
}
