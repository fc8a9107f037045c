//! Live Supervisor - plays or records a live broadcast whenever it is on air.
//!
//! This is the main library crate. It provides the supervisor loop, the session
//! runner with its stall watchdog, and the liveness provider contract.

pub mod provider;
pub mod session;
pub mod supervisor;
pub mod utils;
pub mod watchdog;

pub use provider::{LivenessProvider, ProbeProvider, ProviderError};
pub use session::{SessionMetadata, SessionMode, SessionRunner, SessionSummary};
pub use supervisor::{IterationOutcome, Supervisor, SupervisorConfig, SupervisorState};
pub use utils::{SupervisorError, SupervisorResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "live_supervisor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
