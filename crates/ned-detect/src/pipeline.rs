//! The windowed event-detection pipeline and its acquisition loop
//!
//! Single-threaded and pull-driven: one logical thread repeatedly requests
//! the next sample from the source (with a bounded wait) and runs
//! buffering, filtering and detection inline before the next pull. No
//! internal concurrency; the cooperative stop flag is checked once per
//! iteration.

use crate::bandpower::{BandPowerEstimator, BandPowerHistory, BandPowerSink, BandPowerSnapshot};
use crate::config::{BandPowerConfig, DetectorStrategy, PipelineConfig};
use crate::detectors::{Detector, PeakDetector, RefractoryGate, ZScoreDetector};
use crate::filters::ZeroPhaseFilter;
use crate::windowing::WindowAssembler;
use ned_core::{
    DetectionEvent, EegMetadata, EventSink, NedError, NedResult, Sample, SampleSource,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything produced by one processed sample
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    /// Events that passed the refractory gate
    pub events: Vec<DetectionEvent>,
    /// Band powers, when this sample completed a window and the stage is on
    pub band_powers: Option<BandPowerSnapshot>,
}

/// Running counters for the acquisition loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Samples accepted from the source
    pub samples_seen: u64,
    /// Samples dropped as invalid (NaN or wrong channel count)
    pub samples_dropped: u64,
    /// Completed analysis windows
    pub windows_completed: u64,
    /// Events delivered to the sink
    pub events_emitted: u64,
    /// Events rejected by the refractory gate
    pub events_suppressed: u64,
    /// Times the source went silent past the grace period
    pub starvation_episodes: u64,
}

struct BandStage {
    config: BandPowerConfig,
    estimator: BandPowerEstimator,
    history: BandPowerHistory,
}

/// Windowed signal-event detector over a live sample stream
///
/// Owns the sliding-window assembler, the configured detection strategy,
/// the refractory gate and the optional band-power stage. The connection
/// handle is passed in by the caller; the pipeline holds no global state.
pub struct DetectionPipeline {
    config: PipelineConfig,
    assembler: WindowAssembler,
    detector: Option<Box<dyn Detector>>,
    gate: RefractoryGate,
    band_stage: Option<BandStage>,
    stats: PipelineStats,
    idle_secs: f32,
    starved: bool,
}

impl DetectionPipeline {
    /// Build a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> NedResult<Self> {
        config.validate()?;

        let metadata = EegMetadata::new(config.sampling_rate, config.channel_count, vec![])?;
        let assembler =
            WindowAssembler::new(metadata, config.frame_samples(), config.window_policy)?;

        let detector: Option<Box<dyn Detector>> = match &config.strategy {
            Some(DetectorStrategy::Peak {
                low_hz,
                high_hz,
                order,
                min_height,
                min_distance,
            }) => {
                let filter =
                    ZeroPhaseFilter::bandpass(*low_hz, *high_hz, *order, config.sampling_rate)?;
                Some(Box::new(PeakDetector::new(filter, *min_height, *min_distance)))
            }
            Some(DetectorStrategy::ZScore { threshold }) => {
                Some(Box::new(ZScoreDetector::new(*threshold)))
            }
            None => None,
        };

        let band_stage = config.band_power.clone().map(|band_config| BandStage {
            estimator: BandPowerEstimator::new(config.sampling_rate),
            history: BandPowerHistory::new(&band_config.bands, band_config.history_len),
            config: band_config,
        });

        let gate = RefractoryGate::new(config.refractory_period as f64);

        Ok(DetectionPipeline {
            config,
            assembler,
            detector,
            gate,
            band_stage,
            stats: PipelineStats::default(),
            idle_secs: 0.0,
            starved: false,
        })
    }

    /// Consume one sample; runs buffering, detection and band power inline
    ///
    /// Transient per-sample problems (invalid sample, flat window) never
    /// fail this call; they are counted and logged instead.
    pub fn process_sample(&mut self, sample: &Sample) -> NedResult<StepOutput> {
        self.stats.samples_seen += 1;
        let mut output = StepOutput::default();

        let window = match self.assembler.push(sample) {
            Some(window) => window,
            None => {
                self.stats.samples_dropped = self.assembler.dropped();
                return Ok(output);
            }
        };
        self.stats.samples_dropped = self.assembler.dropped();
        self.stats.windows_completed += 1;
        debug!(start = window.start_time, "window completed");

        if let Some(detector) = self.detector.as_mut() {
            for channel in 0..window.channel_count() {
                if let Some(event) = detector.detect(&window, channel)? {
                    if self.gate.allow(channel, event.timestamp) {
                        self.gate.record(channel, event.timestamp);
                        self.stats.events_emitted += 1;
                        output.events.push(event);
                    } else {
                        self.stats.events_suppressed += 1;
                        debug!(
                            channel,
                            timestamp = event.timestamp,
                            "event suppressed by refractory gate"
                        );
                    }
                }
            }
        }

        if let Some(stage) = self.band_stage.as_mut() {
            let data = window.channel_data(stage.config.channel)?;
            let snapshot = stage.estimator.snapshot(
                &data,
                window.start_time,
                &stage.config.bands,
                stage.config.log_compress,
            )?;
            stage.history.push(&snapshot);
            output.band_powers = Some(snapshot);
        }

        Ok(output)
    }

    /// One bounded-wait pull followed by inline processing
    ///
    /// Returns `NoSignal` once the source has been silent past the grace
    /// period; the pipeline stays usable and resumes with the next sample.
    pub fn poll(&mut self, source: &mut dyn SampleSource) -> NedResult<StepOutput> {
        let timeout = Duration::from_millis(self.config.poll_timeout_ms);

        match source.pull(timeout)? {
            Some(sample) => {
                if self.starved {
                    info!(idle = self.idle_secs as f64, "signal restored");
                    self.starved = false;
                }
                self.idle_secs = 0.0;
                self.process_sample(&sample)
            }
            None => {
                self.idle_secs += timeout.as_secs_f32();
                if self.idle_secs >= self.config.grace_period {
                    if !self.starved {
                        self.starved = true;
                        self.stats.starvation_episodes += 1;
                        warn!(
                            idle = self.idle_secs as f64,
                            "no samples past the grace period, pipeline paused"
                        );
                    }
                    return Err(NedError::NoSignal {
                        elapsed: self.idle_secs,
                    });
                }
                Ok(StepOutput::default())
            }
        }
    }

    /// Drive the acquisition loop until the stop flag is raised
    ///
    /// Events go to `events` after the refractory gate; each completed
    /// window's band powers go to `band_sink` when configured. Starvation
    /// pauses the loop without ending it; a closed source is terminal.
    pub fn run(
        &mut self,
        source: &mut dyn SampleSource,
        events: &mut dyn EventSink,
        mut band_sink: Option<&mut dyn BandPowerSink>,
        stop: &AtomicBool,
    ) -> NedResult<PipelineStats> {
        info!(pipeline = %self.config.name, "acquisition loop started");

        while !stop.load(Ordering::Relaxed) {
            match self.poll(source) {
                Ok(output) => {
                    for event in &output.events {
                        events.on_event(event);
                    }
                    if let Some(snapshot) = &output.band_powers {
                        if let Some(sink) = band_sink.as_mut() {
                            sink.on_band_powers(snapshot);
                        }
                    }
                }
                // Already logged; keep polling so the loop resumes with the signal
                Err(NedError::NoSignal { .. }) => continue,
                Err(e) => {
                    warn!(error = %e, "acquisition loop terminated");
                    return Err(e);
                }
            }
        }

        info!(pipeline = %self.config.name, "acquisition loop stopped");
        Ok(self.stats.clone())
    }

    /// Current counters
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// The configuration the pipeline was built from
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Band-power display history, when the stage is configured
    pub fn band_history(&self) -> Option<&BandPowerHistory> {
        self.band_stage.as_ref().map(|stage| &stage.history)
    }

    /// Clear buffers, detector state and the refractory gate
    pub fn reset(&mut self) {
        self.assembler.reset();
        if let Some(detector) = self.detector.as_mut() {
            detector.reset();
        }
        self.gate.reset();
        self.idle_secs = 0.0;
        self.starved = false;
    }
}

/// Event sink that writes one log line per detection
pub struct LogSink {
    label: String,
}

impl LogSink {
    pub fn new(label: &str) -> Self {
        LogSink {
            label: label.to_string(),
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new("event")
    }
}

impl EventSink for LogSink {
    fn on_event(&mut self, event: &DetectionEvent) {
        info!(
            "{} detected at {:.2}s with score {:.2} (channel {})",
            self.label, event.timestamp, event.metric, event.channel
        );
    }
}
