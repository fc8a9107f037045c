//! Shared utilities

pub mod error;
pub mod time;

pub use error::{SupervisorError, SupervisorResult};
pub use time::now_millis;
