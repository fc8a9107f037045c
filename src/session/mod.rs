//! Session runner
//!
//! One session is one run of an external media tool against a live source:
//! - `SessionRunner` launches the player or recorder and waits for it
//! - `OutputPump` forwards the tool's output to the log and the activity clock
//! - `SessionMetadata` is the sidecar written after every recording

pub mod metadata;
pub mod output;
pub mod paths;
pub mod runner;
pub mod state;

pub use metadata::SessionMetadata;
pub use output::OutputPump;
pub use paths::{derive_dir_name, RecordingPaths};
pub use runner::SessionRunner;
pub use state::{ExitReason, Session, SessionMode, SessionSummary};
