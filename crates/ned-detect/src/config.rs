//! Pipeline configuration and presets

use crate::bandpower::FrequencyBand;
use crate::filters::ZeroPhaseFilter;
use crate::windowing::WindowPolicy;
use ned_core::{EegMetadata, NedError, NedResult};
use serde::{Deserialize, Serialize};

/// Detection strategy, selected by configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DetectorStrategy {
    /// Band-limit the window, then pick peaks above a fixed amplitude
    Peak {
        /// Low cutoff of the band in Hz
        low_hz: f32,
        /// High cutoff of the band in Hz
        high_hz: f32,
        /// Butterworth order per band edge
        order: usize,
        /// Minimum filtered amplitude for a peak
        min_height: f32,
        /// Minimum spacing between peaks, in samples
        min_distance: usize,
    },
    /// Standardized first difference against a z-score threshold
    ZScore {
        /// Minimum z-score for a detection
        threshold: f32,
    },
}

/// Band-power stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPowerConfig {
    /// Channel the spectrum is computed from
    pub channel: usize,
    /// Bands to evaluate each window
    pub bands: Vec<FrequencyBand>,
    /// Apply log(1 + power) before reporting
    pub log_compress: bool,
    /// Display history length, in frames
    pub history_len: usize,
}

impl Default for BandPowerConfig {
    fn default() -> Self {
        BandPowerConfig {
            channel: 0,
            bands: FrequencyBand::eeg_bands(),
            log_compress: true,
            history_len: 100,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration name/profile
    pub name: String,
    /// Nominal sampling rate in Hz
    pub sampling_rate: f32,
    /// Channels tracked by the pipeline
    pub channel_count: usize,
    /// Analysis window length in seconds
    pub frame_interval: f32,
    /// Buffer behavior after each completed window
    pub window_policy: WindowPolicy,
    /// Detection strategy; omit for a band-power-only pipeline
    pub strategy: Option<DetectorStrategy>,
    /// Seconds during which repeat detections on a channel are suppressed
    pub refractory_period: f32,
    /// Optional band-power stage
    pub band_power: Option<BandPowerConfig>,
    /// Bounded wait per pull, in milliseconds
    pub poll_timeout_ms: u64,
    /// Seconds of silence before the pipeline reports starvation
    pub grace_period: f32,
}

impl PipelineConfig {
    /// Blink detection via band-limited peaks, as on a Muse forehead pair:
    /// 1-10 Hz order-4 bandpass over a sliding 2 s window, 100 µV peaks at
    /// least 50 samples apart.
    pub fn blink_peak() -> Self {
        PipelineConfig {
            name: "blink-peak".to_string(),
            sampling_rate: 256.0,
            channel_count: 2,
            frame_interval: 2.0,
            window_policy: WindowPolicy::Slide { hop: 1 },
            strategy: Some(DetectorStrategy::Peak {
                low_hz: 1.0,
                high_hz: 10.0,
                order: 4,
                min_height: 100.0,
                min_distance: 50,
            }),
            refractory_period: 0.3,
            band_power: None,
            poll_timeout_ms: 100,
            grace_period: 2.0,
        }
    }

    /// Blink detection via the derivative z-score: one channel, 1 s
    /// non-overlapping windows, threshold 3.0, 0.3 s refractory period.
    pub fn blink_zscore() -> Self {
        PipelineConfig {
            name: "blink-zscore".to_string(),
            sampling_rate: 256.0,
            channel_count: 1,
            frame_interval: 1.0,
            window_policy: WindowPolicy::Clear,
            strategy: Some(DetectorStrategy::ZScore { threshold: 3.0 }),
            refractory_period: 0.3,
            band_power: None,
            poll_timeout_ms: 100,
            grace_period: 2.0,
        }
    }

    /// Band-power monitoring: 0.5 s non-overlapping frames, the five EEG
    /// bands log-compressed into a 100-frame display history. No detector.
    pub fn band_power_monitor() -> Self {
        PipelineConfig {
            name: "band-power".to_string(),
            sampling_rate: 256.0,
            channel_count: 1,
            frame_interval: 0.5,
            window_policy: WindowPolicy::Clear,
            strategy: None,
            refractory_period: 0.0,
            band_power: Some(BandPowerConfig::default()),
            poll_timeout_ms: 100,
            grace_period: 2.0,
        }
    }

    /// Analysis window length in samples
    pub fn frame_samples(&self) -> usize {
        (self.sampling_rate * self.frame_interval).round() as usize
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> NedResult<()> {
        if self.name.is_empty() {
            return Err(NedError::ConfigurationError {
                message: "Pipeline name cannot be empty".to_string(),
            });
        }

        EegMetadata::validate_sampling_rate(self.sampling_rate)?;
        EegMetadata::validate_channel_count(self.channel_count)?;

        let nyquist = self.sampling_rate / 2.0;
        let frame_samples = self.frame_samples();

        if self.frame_interval <= 0.0 || frame_samples < 2 {
            return Err(NedError::ConfigurationError {
                message: format!("Frame interval {}s is too short", self.frame_interval),
            });
        }

        if let WindowPolicy::Slide { hop } = self.window_policy {
            if hop == 0 || hop > frame_samples {
                return Err(NedError::ConfigurationError {
                    message: format!(
                        "Slide hop {} must be between 1 and the frame size {}",
                        hop, frame_samples
                    ),
                });
            }
        }

        if self.strategy.is_none() && self.band_power.is_none() {
            return Err(NedError::ConfigurationError {
                message: "Pipeline needs a detection strategy or a band-power stage".to_string(),
            });
        }

        match &self.strategy {
            Some(DetectorStrategy::Peak {
                low_hz,
                high_hz,
                order,
                min_height,
                min_distance,
            }) => {
                if *low_hz <= 0.0 || low_hz >= high_hz || *high_hz >= nyquist {
                    return Err(NedError::ConfigurationError {
                        message: format!(
                            "Peak band {}-{}Hz invalid for Nyquist {}Hz",
                            low_hz, high_hz, nyquist
                        ),
                    });
                }
                if *order == 0 || *order > ZeroPhaseFilter::MAX_ORDER {
                    return Err(NedError::ConfigurationError {
                        message: format!("Filter order {} outside 1-{}", order, ZeroPhaseFilter::MAX_ORDER),
                    });
                }
                // Zero-phase filtering needs room for its edge extension
                let min_window = 3 * (2 * order + 1) + 1;
                if frame_samples < min_window {
                    return Err(NedError::ConfigurationError {
                        message: format!(
                            "Frame of {} samples too short for order-{} zero-phase filtering (needs {})",
                            frame_samples, order, min_window
                        ),
                    });
                }
                if *min_height <= 0.0 {
                    return Err(NedError::ConfigurationError {
                        message: "Peak height threshold must be positive".to_string(),
                    });
                }
                if *min_distance == 0 {
                    return Err(NedError::ConfigurationError {
                        message: "Peak distance must be at least 1 sample".to_string(),
                    });
                }
            }
            Some(DetectorStrategy::ZScore { threshold }) => {
                if *threshold <= 0.0 {
                    return Err(NedError::ConfigurationError {
                        message: "Z-score threshold must be positive".to_string(),
                    });
                }
            }
            None => {}
        }

        if self.refractory_period < 0.0 {
            return Err(NedError::ConfigurationError {
                message: "Refractory period cannot be negative".to_string(),
            });
        }

        if let Some(band_config) = &self.band_power {
            if band_config.channel >= self.channel_count {
                return Err(NedError::ConfigurationError {
                    message: format!(
                        "Band-power channel {} out of bounds ({} channels)",
                        band_config.channel, self.channel_count
                    ),
                });
            }
            if band_config.bands.is_empty() {
                return Err(NedError::ConfigurationError {
                    message: "Band-power stage needs at least one band".to_string(),
                });
            }
            if band_config.history_len == 0 {
                return Err(NedError::ConfigurationError {
                    message: "Band-power history length must be positive".to_string(),
                });
            }
            for band in &band_config.bands {
                if band.low_hz < 0.0 || band.low_hz >= band.high_hz || band.low_hz >= nyquist {
                    return Err(NedError::ConfigurationError {
                        message: format!(
                            "Band '{}' ({}-{}Hz) invalid for Nyquist {}Hz",
                            band.name, band.low_hz, band.high_hz, nyquist
                        ),
                    });
                }
            }
        }

        if self.poll_timeout_ms == 0 {
            return Err(NedError::ConfigurationError {
                message: "Poll timeout must be positive".to_string(),
            });
        }
        if self.grace_period < 0.0 {
            return Err(NedError::ConfigurationError {
                message: "Grace period cannot be negative".to_string(),
            });
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> NedResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NedError::SerializationError {
            message: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> NedResult<Self> {
        serde_json::from_str(json).map_err(|e| NedError::SerializationError {
            message: format!("Failed to deserialize configuration: {}", e),
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::blink_zscore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(PipelineConfig::blink_peak().validate().is_ok());
        assert!(PipelineConfig::blink_zscore().validate().is_ok());
        assert!(PipelineConfig::band_power_monitor().validate().is_ok());
    }

    #[test]
    fn test_frame_samples() {
        let config = PipelineConfig::blink_peak();
        assert_eq!(config.frame_samples(), 512); // 2s at 256Hz

        let config = PipelineConfig::band_power_monitor();
        assert_eq!(config.frame_samples(), 128); // 0.5s at 256Hz
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = PipelineConfig::blink_peak();
        config.strategy = Some(DetectorStrategy::Peak {
            low_hz: 1.0,
            high_hz: 200.0, // above Nyquist
            order: 4,
            min_height: 100.0,
            min_distance: 50,
        });
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::blink_zscore();
        config.strategy = Some(DetectorStrategy::ZScore { threshold: -1.0 });
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::blink_zscore();
        config.strategy = None; // no detector and no band power
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::band_power_monitor();
        if let Some(band_config) = config.band_power.as_mut() {
            band_config.channel = 7; // out of bounds for 1 channel
        }
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::blink_peak();
        config.frame_interval = 0.05; // 12 samples: too short for order-4 filtfilt
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::blink_zscore();
        config.window_policy = WindowPolicy::Slide { hop: 100_000 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::blink_peak();
        let json = config.to_json().unwrap();
        assert!(!json.is_empty());

        let restored = PipelineConfig::from_json(&json).unwrap();
        assert_eq!(restored.name, config.name);
        assert_eq!(restored.frame_samples(), config.frame_samples());
        assert_eq!(restored.strategy, config.strategy);
    }
}
