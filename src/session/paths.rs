//! Recording destination layout
//!
//! A recording started at `T` for a source whose directory name is `room` lives
//! under `<root>/room/`:
//! - `T_000.flv`, `T_001.flv`, ...: one-hour media segments
//! - `T_out.list`: the recorder's segment index
//! - `T.json`: the session metadata sidecar

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Used when neither the room name nor the live URL yields a usable name
pub const FALLBACK_DIR_NAME: &str = "live";

/// Directory name for a source: the alphabetic characters of its room name,
/// else the last segment of its live URL (one trailing `/` ignored).
pub fn derive_dir_name(live_room_name: &str, live_url: &str) -> String {
    let alpha: String = live_room_name.chars().filter(|c| c.is_alphabetic()).collect();
    if !alpha.is_empty() {
        return alpha;
    }

    let url = live_url.strip_suffix('/').unwrap_or(live_url);
    let segment = url.rsplit('/').next().unwrap_or("").trim();
    if !segment.is_empty() {
        return segment.to_string();
    }

    FALLBACK_DIR_NAME.to_string()
}

/// Append `suffix` to the final path component without treating dots specially
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path: OsString = base.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Every path a single recording session writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingPaths {
    /// `<root>/<dir>/<start>`
    pub base: PathBuf,
    /// Media file extension, without the dot
    pub extension: String,
}

impl RecordingPaths {
    pub fn new(record_root: &Path, dir_name: &str, start_ms: i64, extension: &str) -> Self {
        Self {
            base: record_root.join(dir_name).join(start_ms.to_string()),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Directory that holds the session's files
    pub fn directory(&self) -> Option<&Path> {
        self.base.parent()
    }

    /// Output pattern handed to the segmenting recorder
    pub fn segment_pattern(&self) -> PathBuf {
        with_suffix(&self.base, &format!("_%03d.{}", self.extension))
    }

    /// Segment index written by the recorder
    pub fn segment_list(&self) -> PathBuf {
        with_suffix(&self.base, "_out.list")
    }

    /// Metadata sidecar
    pub fn sidecar(&self) -> PathBuf {
        with_suffix(&self.base, ".json")
    }

    /// Nominal output name, used for logging
    pub fn display_target(&self) -> PathBuf {
        with_suffix(&self.base, &format!(".{}", self.extension))
    }

    /// Create any missing parent directories
    pub fn prepare(&self) -> std::io::Result<()> {
        if let Some(dir) = self.directory() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}
