//! Liveness providers
//!
//! The supervisor never knows how a particular site reports liveness. It talks
//! to a `LivenessProvider`, and this module ships one generic implementation
//! that probes a fixed stream URL.

pub mod probe;
pub mod traits;

pub use probe::ProbeProvider;
pub use traits::{LivenessProvider, ProviderError};
