//! Session metadata sidecar
//!
//! Written once per recording, after the recorder has exited.

use super::state::Session;
use crate::utils::SupervisorResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Durable record of one completed recording session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub live_room_name: String,
    pub live_url: String,
    pub start_time: i64,
    pub stop_time: i64,
    /// `<startTime>.<extension>`
    pub file_name: String,
}

impl SessionMetadata {
    /// Build the record for a finished session
    pub fn for_session(
        live_room_name: &str,
        live_url: &str,
        session: &Session,
        extension: &str,
    ) -> Self {
        let stop_time = session.stop_ms.unwrap_or(session.start_ms).max(session.start_ms);
        Self {
            live_room_name: live_room_name.to_string(),
            live_url: live_url.to_string(),
            start_time: session.start_ms,
            stop_time,
            file_name: format!("{}.{}", session.start_ms, extension.trim_start_matches('.')),
        }
    }

    /// Write to `path`, replacing any stale file there
    pub fn write(&self, path: &Path) -> SupervisorResult<()> {
        if path.exists() {
            fs::remove_file(path)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        tracing::debug!("Saved session metadata to {:?}", path);
        Ok(())
    }

    /// Read a sidecar back
    pub fn read(path: &Path) -> SupervisorResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::SessionMode;
    use tempfile::tempdir;

    fn finished(start: i64, stop: i64) -> Session {
        let mut session = Session::begin_at(SessionMode::Record, "rtmp://x/y", start);
        session.finish_at(stop);
        session
    }

    #[test]
    fn test_json_field_names() {
        let metadata =
            SessionMetadata::for_session("Room", "http://example.com/abc", &finished(1_000, 4_000), "flv");
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["liveRoomName"], "Room");
        assert_eq!(json["liveUrl"], "http://example.com/abc");
        assert_eq!(json["startTime"], 1_000);
        assert_eq!(json["stopTime"], 4_000);
        assert_eq!(json["fileName"], "1000.flv");
    }

    #[test]
    fn test_write_replaces_stale_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1000.json");
        fs::write(&path, "stale contents that are not json").unwrap();

        let metadata = SessionMetadata::for_session("Room", "u", &finished(1_000, 2_500), "flv");
        metadata.write(&path).unwrap();

        let loaded = SessionMetadata::read(&path).unwrap();
        assert_eq!(loaded, metadata);
        assert!(loaded.stop_time >= loaded.start_time);
    }

    #[test]
    fn test_unfinished_session_has_zero_duration() {
        let session = Session::begin_at(SessionMode::Record, "rtmp://x/y", 7_000);
        let metadata = SessionMetadata::for_session("Room", "u", &session, "flv");
        assert_eq!(metadata.stop_time, metadata.start_time);
    }
}
