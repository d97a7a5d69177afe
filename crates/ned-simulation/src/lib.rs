//! NED-Simulation: synthetic EEG generation and test sources
//!
//! Deterministic sample sources for tests plus a tokio-paced real-time
//! stream for live demos.

pub mod eeg_simulator;
pub mod signal_patterns;
pub mod stream;

pub use eeg_simulator::*;
pub use signal_patterns::*;
pub use stream::*;
