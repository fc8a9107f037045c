//! Session state
//!
//! Defines the session modes and the bookkeeping kept for one session.

use crate::utils::now_millis;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// What to do with a live source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Open the stream in a local player
    Playback,
    /// Save the stream to disk in segments
    Record,
}

impl Default for SessionMode {
    fn default() -> Self {
        Self::Record
    }
}

/// Why the media tool stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ExitReason {
    /// The tool exited by itself (code is `None` when killed by a signal)
    Exited { code: Option<i32> },
    /// The watchdog killed the tool after output stalled
    Stalled,
}

/// One attempt to play or record a live source
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier used to correlate log lines
    pub id: Uuid,

    pub mode: SessionMode,

    /// Stream URL the tool was pointed at
    pub stream_url: String,

    /// Base path of the recording (record mode only)
    pub destination: Option<PathBuf>,

    /// Unix timestamp when the session started
    pub start_ms: i64,

    /// Unix timestamp when the tool exited
    pub stop_ms: Option<i64>,
}

impl Session {
    /// Start a session now
    pub fn begin(mode: SessionMode, stream_url: &str) -> Self {
        Self::begin_at(mode, stream_url, now_millis())
    }

    pub fn begin_at(mode: SessionMode, stream_url: &str, start_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            stream_url: stream_url.to_string(),
            destination: None,
            start_ms,
            stop_ms: None,
        }
    }

    /// End the session now
    pub fn finish(&mut self) -> i64 {
        self.finish_at(now_millis())
    }

    /// End the session at `stop_ms`, clamped so it never precedes the start
    pub fn finish_at(&mut self, stop_ms: i64) -> i64 {
        let stop = stop_ms.max(self.start_ms);
        self.stop_ms = Some(stop);
        stop
    }

    /// Elapsed milliseconds, or `None` while still running
    pub fn duration_ms(&self) -> Option<i64> {
        self.stop_ms.map(|stop| stop - self.start_ms)
    }

    /// Summarize a finished session
    pub fn summary(&self, exit: ExitReason, metadata_path: Option<PathBuf>) -> SessionSummary {
        let stop_ms = self.stop_ms.unwrap_or(self.start_ms);
        SessionSummary {
            id: self.id,
            mode: self.mode,
            start_ms: self.start_ms,
            stop_ms,
            duration_ms: stop_ms - self.start_ms,
            exit,
            metadata_path,
        }
    }
}

/// Result of a completed session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,

    pub mode: SessionMode,

    /// Unix timestamp when the session started
    pub start_ms: i64,

    /// Unix timestamp when the session ended
    pub stop_ms: i64,

    /// Total duration in milliseconds
    pub duration_ms: i64,

    pub exit: ExitReason,

    /// Sidecar written for this session, if any
    pub metadata_path: Option<PathBuf>,
}
