//! NED-Core: Foundation types for neural event detection
//!
//! Shared types for the windowed EEG event-detection pipeline: samples,
//! window entities, stream metadata, detection events and the sample
//! source contract.

pub mod eeg_types;
pub mod error;
pub mod event;
pub mod sample;
pub mod source;
pub mod window_entity;

pub use eeg_types::*;
pub use error::{NedError, NedResult};
pub use event::*;
pub use sample::*;
pub use source::*;
pub use window_entity::*;
