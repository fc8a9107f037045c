//! Supervisor state
//!
//! The loop alternates between two states and never terminates on its own.

use serde::{Deserialize, Serialize};

/// Current state of the supervisor loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorState {
    /// Polling for liveness or sleeping between polls
    Idle,
    /// A session is running
    Live,
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self::Idle
    }
}
