//! Stall detection
//!
//! Output readers advance an `ActivityClock`; the `StallWatchdog` reads it and
//! asks for the recorder to be killed once output stops for too long.

pub mod clock;
pub mod stall;

pub use clock::ActivityClock;
pub use stall::{StallWatchdog, WatchdogOutcome};
