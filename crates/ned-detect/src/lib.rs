//! NED-Detect: Windowed event detection for streaming EEG
//!
//! Sliding-window buffering, zero-phase band-limited filtering, peak and
//! z-score detection strategies behind one trait, a per-channel refractory
//! gate, and periodogram band-power estimation, driven by a synchronous
//! pull-based acquisition loop.

pub mod bandpower;
pub mod config;
pub mod detectors;
pub mod filters;
pub mod pipeline;
pub mod windowing;

pub use bandpower::{
    BandPowerEstimator, BandPowerHistory, BandPowerSink, BandPowerSnapshot, FrequencyBand,
};
pub use config::{BandPowerConfig, DetectorStrategy, PipelineConfig};
pub use detectors::{find_peaks, Detector, PeakDetector, RefractoryGate, ZScoreDetector};
pub use filters::ZeroPhaseFilter;
pub use pipeline::{DetectionPipeline, LogSink, PipelineStats, StepOutput};
pub use windowing::{WindowAssembler, WindowPolicy};
