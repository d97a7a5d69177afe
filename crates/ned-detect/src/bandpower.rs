//! Spectral band power estimation
//!
//! Single-segment periodogram (Welch's method with one segment spanning
//! the whole window): Hann window, one-sided PSD normalized to
//! amplitude²/Hz, averaged over the bins inside each named band.

use ned_core::{NedError, NedResult};
use num_complex::Complex;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A named frequency band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low_hz: f32,
    pub high_hz: f32,
}

impl FrequencyBand {
    pub fn new(name: &str, low_hz: f32, high_hz: f32) -> Self {
        FrequencyBand {
            name: name.to_string(),
            low_hz,
            high_hz,
        }
    }

    /// The standard EEG bands
    pub fn eeg_bands() -> Vec<FrequencyBand> {
        vec![
            FrequencyBand::new("Delta", 0.5, 4.0),
            FrequencyBand::new("Theta", 4.0, 8.0),
            FrequencyBand::new("Alpha", 8.0, 12.0),
            FrequencyBand::new("Beta", 12.0, 30.0),
            FrequencyBand::new("Gamma", 30.0, 100.0),
        ]
    }

    /// True when `freq` falls inside this band (inclusive bounds)
    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.low_hz && freq <= self.high_hz
    }
}

/// Band powers computed from one completed window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandPowerSnapshot {
    /// Start time of the window the powers were computed from
    pub window_start: f64,
    /// (band name, scaled power) in band order
    pub powers: Vec<(String, f32)>,
}

impl BandPowerSnapshot {
    /// Power for a band by name
    pub fn power(&self, band: &str) -> Option<f32> {
        self.powers
            .iter()
            .find(|(name, _)| name == band)
            .map(|(_, p)| *p)
    }
}

/// Consumer of one band-power snapshot per completed window
pub trait BandPowerSink {
    fn on_band_powers(&mut self, snapshot: &BandPowerSnapshot);
}

/// Periodogram-based band power estimator
pub struct BandPowerEstimator {
    sampling_rate: f32,
    planner: RealFftPlanner<f32>,
}

impl BandPowerEstimator {
    pub fn new(sampling_rate: f32) -> Self {
        BandPowerEstimator {
            sampling_rate,
            planner: RealFftPlanner::new(),
        }
    }

    /// One-sided power spectral density of the window, `n/2 + 1` bins
    ///
    /// Normalization is `2 |X[k]|² / (fs · S2)` with `S2 = Σ w²` for the
    /// Hann window (no doubling at DC and Nyquist), giving amplitude²/Hz.
    pub fn psd(&mut self, window: &[f32]) -> NedResult<Vec<f32>> {
        let n = window.len();
        if n < 4 {
            return Err(NedError::InsufficientData {
                required: 4,
                actual: n,
            });
        }

        // Periodic Hann window
        let mut s2 = 0.0f32;
        let mut input: Vec<f32> = (0..n)
            .map(|i| {
                let w = 0.5
                    * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos());
                s2 += w * w;
                window[i] * w
            })
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        let mut spectrum: Vec<Complex<f32>> = fft.make_output_vec();
        fft.process(&mut input, &mut spectrum)
            .map_err(|e| NedError::ProcessingError {
                message: format!("FFT failed: {}", e),
            })?;

        let scale = 1.0 / (self.sampling_rate * s2);
        let last = spectrum.len() - 1;
        let psd = spectrum
            .iter()
            .enumerate()
            .map(|(k, bin)| {
                let one_sided = if k == 0 || (n % 2 == 0 && k == last) {
                    1.0
                } else {
                    2.0
                };
                bin.norm_sqr() * scale * one_sided
            })
            .collect();

        Ok(psd)
    }

    /// Mean spectral density across the bins inside `[low_hz, high_hz]`
    ///
    /// A band with no bins below Nyquist contributes 0.0.
    pub fn band_power(&mut self, window: &[f32], low_hz: f32, high_hz: f32) -> NedResult<f32> {
        let psd = self.psd(window)?;
        Ok(Self::mean_in_band(
            &psd,
            self.sampling_rate,
            window.len(),
            low_hz,
            high_hz,
        ))
    }

    /// Evaluate every band from a single PSD computation
    pub fn snapshot(
        &mut self,
        window: &[f32],
        window_start: f64,
        bands: &[FrequencyBand],
        log_compress: bool,
    ) -> NedResult<BandPowerSnapshot> {
        let psd = self.psd(window)?;
        let n = window.len();
        let fs = self.sampling_rate;

        let powers = bands
            .iter()
            .map(|band| {
                let mut power = Self::mean_in_band(&psd, fs, n, band.low_hz, band.high_hz);
                if log_compress {
                    // log(1 + p) expands small values without going negative
                    power = (1.0 + power).ln();
                }
                (band.name.clone(), power)
            })
            .collect();

        Ok(BandPowerSnapshot {
            window_start,
            powers,
        })
    }

    fn mean_in_band(psd: &[f32], fs: f32, n: usize, low_hz: f32, high_hz: f32) -> f32 {
        let freq_res = fs / n as f32;
        let mut sum = 0.0f32;
        let mut count = 0usize;

        for (k, &density) in psd.iter().enumerate() {
            let freq = k as f32 * freq_res;
            if freq >= low_hz && freq <= high_hz {
                sum += density;
                count += 1;
            }
        }

        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

/// Bounded per-band history for display
///
/// Each band keeps the last `capacity` values, pre-filled with zeros so a
/// consumer always sees a full-length series; the oldest value drops once
/// the capacity is reached.
#[derive(Debug, Clone)]
pub struct BandPowerHistory {
    capacity: usize,
    series: Vec<(String, VecDeque<f32>)>,
}

impl BandPowerHistory {
    pub fn new(bands: &[FrequencyBand], capacity: usize) -> Self {
        let series = bands
            .iter()
            .map(|band| {
                let mut values = VecDeque::with_capacity(capacity);
                values.extend(std::iter::repeat(0.0).take(capacity));
                (band.name.clone(), values)
            })
            .collect();

        BandPowerHistory { capacity, series }
    }

    /// Append one snapshot; unknown band names are ignored
    pub fn push(&mut self, snapshot: &BandPowerSnapshot) {
        for (name, power) in &snapshot.powers {
            if let Some((_, values)) = self.series.iter_mut().find(|(n, _)| n == name) {
                if values.len() == self.capacity {
                    values.pop_front();
                }
                values.push_back(*power);
            }
        }
    }

    /// The recorded series for one band
    pub fn series(&self, band: &str) -> Option<&VecDeque<f32>> {
        self.series
            .iter()
            .find(|(name, _)| name == band)
            .map(|(_, values)| values)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
