//! Supervisor loop
//!
//! This module implements the perpetual watch-and-capture loop:
//! - `Supervisor` polls the liveness provider and runs sessions
//! - `SupervisorConfig` holds intervals, thresholds and tool names
//! - `SupervisorState` is the observable Idle/Live state machine

pub mod config;
pub mod coordinator;
pub mod state;

pub use config::{SourceConfig, SupervisorConfig};
pub use coordinator::{IterationOutcome, Supervisor, SupervisorEvent};
pub use state::SupervisorState;
