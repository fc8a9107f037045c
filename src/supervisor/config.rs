//! Supervisor configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration that records with `ffmpeg` into `./record`.

use crate::session::SessionMode;
use crate::utils::{SupervisorError, SupervisorResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime parameters for the supervisor loop and its sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupervisorConfig {
    /// Play or record when the source goes live
    pub mode: SessionMode,

    /// Root directory for recordings
    pub record_root: PathBuf,

    /// Player program, invoked with the stream URL as its only argument
    pub player: String,

    /// Segmenting recorder program (ffmpeg-compatible arguments)
    pub recorder: String,

    /// Media file extension for recorded segments
    pub extension: String,

    /// Segment length passed to the recorder
    pub segment_time: String,

    /// Sleep between polls while offline or after a normal session
    pub idle_interval_ms: u64,

    /// Sessions shorter than this are retried without sleeping
    pub min_session_ms: u64,

    /// Sleep after a failed iteration
    pub failure_backoff_ms: u64,

    /// Output silence after which a recording is killed
    pub stall_timeout_ms: u64,

    /// How often the stall watchdog checks for silence
    pub watchdog_interval_ms: u64,

    /// Generic liveness source used by the bundled binary
    pub source: Option<SourceConfig>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::Record,
            record_root: PathBuf::from("record"),
            player: "ffplay".to_string(),
            recorder: "ffmpeg".to_string(),
            extension: "flv".to_string(),
            segment_time: "1:00:00".to_string(),
            idle_interval_ms: 60_000,
            min_session_ms: 10_000,
            failure_backoff_ms: 60_000,
            stall_timeout_ms: 20_000,
            watchdog_interval_ms: 5_000,
            source: None,
        }
    }
}

impl SupervisorConfig {
    /// Read and validate a configuration file
    pub fn from_file(path: &Path) -> SupervisorResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: SupervisorConfig = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::debug!("Loaded configuration from {:?}", path);

        Ok(config)
    }

    /// Reject values the supervisor cannot run with
    pub fn validate(&self) -> SupervisorResult<()> {
        if self.watchdog_interval_ms == 0 {
            return Err(SupervisorError::Config(
                "watchdogIntervalMs must be greater than zero".to_string(),
            ));
        }
        if self.stall_timeout_ms == 0 {
            return Err(SupervisorError::Config(
                "stallTimeoutMs must be greater than zero".to_string(),
            ));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(SupervisorError::Config("extension must not be empty".to_string()));
        }
        let program = match self.mode {
            SessionMode::Playback => &self.player,
            SessionMode::Record => &self.recorder,
        };
        if program.trim().is_empty() {
            return Err(SupervisorError::Config(format!(
                "no program configured for {:?} mode",
                self.mode
            )));
        }
        Ok(())
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }
}

/// A fixed stream URL watched by probing it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Display name of the room
    pub live_room_name: String,

    /// Canonical page URL
    #[serde(default)]
    pub live_url: String,

    /// Stream URL handed to the player or recorder
    pub stream_url: String,

    /// Probe program
    #[serde(default = "default_probe")]
    pub probe: String,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_probe() -> String {
    "ffprobe".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    15_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.mode, SessionMode::Record);
        assert_eq!(config.idle_interval(), Duration::from_secs(60));
        assert_eq!(config.min_session_ms, 10_000);
        assert_eq!(config.stall_timeout(), Duration::from_secs(20));
        assert_eq!(config.watchdog_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "mode": "playback",
                "idleIntervalMs": 1000,
                "source": { "liveRoomName": "Room", "streamUrl": "rtmp://x/y" }
            }"#,
        )
        .unwrap();

        let config = SupervisorConfig::from_file(&path).unwrap();
        assert_eq!(config.mode, SessionMode::Playback);
        assert_eq!(config.idle_interval_ms, 1000);
        assert_eq!(config.recorder, "ffmpeg");

        let source = config.source.unwrap();
        assert_eq!(source.probe, "ffprobe");
        assert_eq!(source.probe_timeout_ms, 15_000);
        assert!(source.live_url.is_empty());
    }

    #[test]
    fn test_rejects_zero_watchdog_interval() {
        let config = SupervisorConfig {
            watchdog_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SupervisorError::Config(_))));
    }

    #[test]
    fn test_rejects_missing_program() {
        let config = SupervisorConfig {
            recorder: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SupervisorConfig::from_file(&path),
            Err(SupervisorError::Serialization(_))
        ));
    }
}
