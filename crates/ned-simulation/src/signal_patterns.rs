//! Pre-defined EEG signal patterns for simulation and test fixtures

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Deterministic waveform underlying a simulated channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// Constant amplitude (flat signal)
    Flat { level: f32 },
    /// Pure sinusoid, e.g. an alpha rhythm
    Sinusoid { frequency: f32, amplitude: f32 },
    /// One rectangular impulse of `width` seconds centered on `at`
    ///
    /// With `width = 1/fs` exactly one sample carries the impulse.
    Spike { at: f32, amplitude: f32, width: f32 },
    /// Blink-shaped Gaussian bumps repeating every `interval` seconds
    Blinks {
        interval: f32,
        amplitude: f32,
        width: f32,
    },
}

impl SignalPattern {
    /// Amplitude contributed by the pattern at `time` seconds
    pub fn value_at(&self, time: f32) -> f32 {
        match self {
            SignalPattern::Flat { level } => *level,

            SignalPattern::Sinusoid { frequency, amplitude } => {
                amplitude * (2.0 * PI * frequency * time).sin()
            }

            SignalPattern::Spike { at, amplitude, width } => {
                if (time - at).abs() < width / 2.0 {
                    *amplitude
                } else {
                    0.0
                }
            }

            SignalPattern::Blinks {
                interval,
                amplitude,
                width,
            } => {
                // Bump centered in each repetition of the interval
                let phase = time.rem_euclid(*interval);
                let d = phase - interval / 2.0;
                let sigma = width / 2.0;
                amplitude * (-(d * d) / (2.0 * sigma * sigma)).exp()
            }
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Flat { .. } => "Flat signal",
            SignalPattern::Sinusoid { .. } => "Pure sinusoid",
            SignalPattern::Spike { .. } => "Single impulse",
            SignalPattern::Blinks { .. } => "Periodic blinks",
        }
    }

    /// Create common preset patterns
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("Rest", SignalPattern::Flat { level: 0.0 }),
            ("Alpha Rhythm", SignalPattern::Sinusoid {
                frequency: 10.0,
                amplitude: 30.0,
            }),
            ("Theta Rhythm", SignalPattern::Sinusoid {
                frequency: 6.0,
                amplitude: 40.0,
            }),
            ("Single Spike", SignalPattern::Spike {
                at: 0.5,
                amplitude: 300.0,
                width: 1.0 / 256.0,
            }),
            ("Relaxed Blinking", SignalPattern::Blinks {
                interval: 3.0,
                amplitude: 250.0,
                width: 0.25,
            }),
            ("Rapid Blinking", SignalPattern::Blinks {
                interval: 0.8,
                amplitude: 200.0,
                width: 0.15,
            }),
        ]
    }
}
