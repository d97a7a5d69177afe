//! Synthetic EEG generation with controllable noise

use crate::signal_patterns::SignalPattern;
use ned_core::{EegMetadata, NedError, NedResult, Sample};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Noise layered on top of the deterministic pattern
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation in µV (0.0 = no noise)
    pub gaussian_std: f32,
    /// Baseline wander amplitude in µV (slow 0.1 Hz drift)
    pub drift_amplitude: f32,
    /// Motion artifact probability per sample (0.0 to 1.0)
    pub artifact_prob: f32,
    /// Motion artifact amplitude in µV
    pub artifact_amp: f32,
}

impl NoiseConfig {
    /// Completely clean output; used by deterministic test fixtures
    pub fn none() -> Self {
        Self {
            gaussian_std: 0.0,
            drift_amplitude: 0.0,
            artifact_prob: 0.0,
            artifact_amp: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 5.0,
            drift_amplitude: 2.0,
            artifact_prob: 0.001,
            artifact_amp: 50.0,
        }
    }
}

/// Configuration for EEG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f32,
    /// Number of channels to simulate
    pub channel_count: usize,
    /// Waveform generated on every channel
    pub pattern: SignalPattern,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Power line interference frequency (50/60 Hz), if any
    pub powerline_freq: Option<f32>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 256.0,
            channel_count: 1,
            pattern: SignalPattern::Blinks {
                interval: 3.0,
                amplitude: 250.0,
                width: 0.25,
            },
            noise: NoiseConfig::default(),
            powerline_freq: Some(50.0),
            seed: None,
        }
    }
}

/// EEG signal simulator
///
/// Produces one timestamped [`Sample`] at a time so a pull-driven consumer
/// can be fed sample by sample; `generate` batches a fixed duration for
/// test fixtures.
pub struct EegSimulator {
    config: SimulatorConfig,
    metadata: EegMetadata,
    rng: rand::rngs::StdRng,
    normal_dist: Normal<f32>,
    index: u64,
}

const POWERLINE_AMPLITUDE: f32 = 2.0;
const OUTPUT_CLAMP: f32 = 1000.0;

impl EegSimulator {
    /// Create new simulator with configuration
    pub fn new(config: SimulatorConfig) -> NedResult<Self> {
        let metadata = EegMetadata::new(config.sampling_rate, config.channel_count, vec![])?;

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| {
            NedError::SimulationError {
                message: format!("Failed to create noise distribution: {}", e),
            }
        })?;

        Ok(EegSimulator {
            config,
            metadata,
            rng,
            normal_dist,
            index: 0,
        })
    }

    /// Stream metadata matching this simulator's output
    pub fn metadata(&self) -> &EegMetadata {
        &self.metadata
    }

    /// Generate the next sample and advance the clock
    pub fn next_sample(&mut self) -> Sample {
        let time = self.index as f32 / self.config.sampling_rate;
        let mut channels = Vec::with_capacity(self.config.channel_count);

        for _ in 0..self.config.channel_count {
            let mut value = self.config.pattern.value_at(time);

            value += self.add_noise(time);

            if let Some(powerline_freq) = self.config.powerline_freq {
                value += POWERLINE_AMPLITUDE
                    * (2.0 * std::f32::consts::PI * powerline_freq * time).sin();
            }

            // Clamp to a plausible electrode range
            value = value.max(-OUTPUT_CLAMP).min(OUTPUT_CLAMP);
            channels.push(value);
        }

        let timestamp = self.index as f64 / self.config.sampling_rate as f64;
        self.index += 1;

        Sample::new(channels, timestamp)
    }

    /// Generate `duration` seconds of samples
    pub fn generate(&mut self, duration: f32) -> Vec<Sample> {
        let count = (duration * self.config.sampling_rate) as usize;
        (0..count).map(|_| self.next_sample()).collect()
    }

    /// Swap the underlying waveform without resetting the clock
    pub fn set_pattern(&mut self, pattern: SignalPattern) {
        self.config.pattern = pattern;
    }

    /// Restart the simulated clock at zero
    pub fn reset_time(&mut self) {
        self.index = 0;
    }

    /// Noise components at `time`
    fn add_noise(&mut self, time: f32) -> f32 {
        let mut noise = 0.0;

        // Gaussian noise
        noise += self.normal_dist.sample(&mut self.rng);

        // Baseline wander (slow drift)
        noise += self.config.noise.drift_amplitude
            * (2.0 * std::f32::consts::PI * 0.1 * time).sin();

        // Motion artifacts (occasional spikes)
        if self.config.noise.artifact_prob > 0.0
            && self.rng.gen::<f32>() < self.config.noise.artifact_prob
        {
            noise += self.config.noise.artifact_amp * self.rng.gen_range(-1.0..1.0);
        }

        noise
    }
}
