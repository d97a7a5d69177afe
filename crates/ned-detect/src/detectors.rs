//! Event detection strategies and the refractory gate

use crate::filters::ZeroPhaseFilter;
use ned_core::{DetectionEvent, NedError, NedResult, WindowEntity};
use std::collections::HashMap;
use tracing::warn;

/// A window-level event detector
///
/// Channels are processed independently; a detector reports at most one
/// event per window per channel. The event timestamp is sample-accurate:
/// `window.start_time + index / fs`.
pub trait Detector: Send {
    /// Examine one channel of a completed window
    fn detect(&mut self, window: &WindowEntity, channel: usize) -> NedResult<Option<DetectionEvent>>;

    /// Strategy name for logs and stats
    fn name(&self) -> &str;

    /// Clear any internal state
    fn reset(&mut self);
}

/// Indices of local maxima at least `min_height` tall and `min_distance`
/// samples apart
///
/// Spacing is enforced tallest-first: when two qualifying peaks are closer
/// than `min_distance`, the smaller one is discarded. Returned indices are
/// ascending.
pub fn find_peaks(data: &[f32], min_height: f32, min_distance: usize) -> Vec<usize> {
    let mut candidates: Vec<usize> = Vec::new();
    for i in 1..data.len().saturating_sub(1) {
        if data[i] > data[i - 1] && data[i] > data[i + 1] && data[i] >= min_height {
            candidates.push(i);
        }
    }

    if min_distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    // Tallest first, then greedily suppress neighbors
    let mut by_height = candidates.clone();
    by_height.sort_by(|&a, &b| data[b].partial_cmp(&data[a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut keep = vec![false; data.len()];
    let mut kept: Vec<usize> = Vec::new();
    for idx in by_height {
        if kept.iter().all(|&k| idx.abs_diff(k) >= min_distance) {
            keep[idx] = true;
            kept.push(idx);
        }
    }

    candidates.into_iter().filter(|&i| keep[i]).collect()
}

/// Threshold/peak strategy
///
/// Band-limits the window with a zero-phase filter, then looks for local
/// maxima above a fixed amplitude. The tallest qualifying peak becomes the
/// event; windows with no qualifying peak produce nothing.
pub struct PeakDetector {
    filter: ZeroPhaseFilter,
    min_height: f32,
    min_distance: usize,
}

impl PeakDetector {
    pub fn new(filter: ZeroPhaseFilter, min_height: f32, min_distance: usize) -> Self {
        PeakDetector {
            filter,
            min_height,
            min_distance,
        }
    }

    /// The filter this detector applies before peak picking
    pub fn filter(&self) -> &ZeroPhaseFilter {
        &self.filter
    }
}

impl Detector for PeakDetector {
    fn detect(&mut self, window: &WindowEntity, channel: usize) -> NedResult<Option<DetectionEvent>> {
        let data = window.channel_data(channel)?;
        let filtered = self.filter.apply(&data)?;

        let peaks = find_peaks(&filtered, self.min_height, self.min_distance);
        let tallest = peaks
            .into_iter()
            .max_by(|&a, &b| {
                filtered[a]
                    .partial_cmp(&filtered[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        Ok(tallest.map(|idx| DetectionEvent::new(channel, window.time_at(idx), filtered[idx])))
    }

    fn name(&self) -> &str {
        "peak"
    }

    fn reset(&mut self) {}
}

/// Z-score/derivative strategy
///
/// Takes the absolute first difference of the raw window, standardizes it,
/// and reports an event when the maximum z-score exceeds the threshold.
/// A flat window (zero standard deviation) yields no detection rather than
/// a division by zero.
pub struct ZScoreDetector {
    threshold: f32,
    degenerate_windows: u64,
}

impl ZScoreDetector {
    pub fn new(threshold: f32) -> Self {
        ZScoreDetector {
            threshold,
            degenerate_windows: 0,
        }
    }

    /// Number of flat windows seen since the last reset
    pub fn degenerate_windows(&self) -> u64 {
        self.degenerate_windows
    }
}

impl Detector for ZScoreDetector {
    fn detect(&mut self, window: &WindowEntity, channel: usize) -> NedResult<Option<DetectionEvent>> {
        let data = window.channel_data(channel)?;
        if data.len() < 2 {
            return Err(NedError::InsufficientData {
                required: 2,
                actual: data.len(),
            });
        }

        let diffs: Vec<f32> = data.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect();

        let mean = diffs.iter().sum::<f32>() / diffs.len() as f32;
        let variance =
            diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f32>() / diffs.len() as f32;
        let std_dev = variance.sqrt();

        if std_dev <= f32::EPSILON {
            // Degenerate window: suppress detection instead of dividing by zero
            self.degenerate_windows += 1;
            warn!(
                channel,
                start = window.start_time,
                "flat window, suppressing detection"
            );
            return Ok(None);
        }

        let (best_idx, best_z) = diffs
            .iter()
            .map(|d| (d - mean) / std_dev)
            .enumerate()
            .fold((0usize, f32::MIN), |acc, (i, z)| {
                if z > acc.1 {
                    (i, z)
                } else {
                    acc
                }
            });

        if best_z > self.threshold {
            // diffs[i] spans samples i and i+1; the transient lands on i+1
            Ok(Some(DetectionEvent::new(
                channel,
                window.time_at(best_idx + 1),
                best_z,
            )))
        } else {
            Ok(None)
        }
    }

    fn name(&self) -> &str {
        "z-score"
    }

    fn reset(&mut self) {
        self.degenerate_windows = 0;
    }
}

/// Per-channel rate limiter for detection events
///
/// Rejects events closer than `period` seconds to the last accepted event
/// on the same channel. Applied uniformly to every strategy by the
/// pipeline.
#[derive(Debug, Clone)]
pub struct RefractoryGate {
    period: f64,
    last_event: HashMap<usize, f64>,
}

impl RefractoryGate {
    pub fn new(period: f64) -> Self {
        RefractoryGate {
            period,
            last_event: HashMap::new(),
        }
    }

    /// Would an event at `timestamp` on `channel` be accepted?
    pub fn allow(&self, channel: usize, timestamp: f64) -> bool {
        match self.last_event.get(&channel) {
            Some(&last) => timestamp - last >= self.period,
            None => true,
        }
    }

    /// Record an accepted event
    pub fn record(&mut self, channel: usize, timestamp: f64) {
        self.last_event.insert(channel, timestamp);
    }

    /// Refractory period in seconds
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Forget all recorded events
    pub fn reset(&mut self) {
        self.last_event.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ned_core::EegMetadata;

    const FS: f32 = 256.0;

    fn window_from(data: Vec<f32>, start_time: f64) -> WindowEntity {
        let metadata = EegMetadata::new(FS, 1, vec![]).unwrap();
        WindowEntity::new(data, metadata, start_time).unwrap()
    }

    #[test]
    fn test_find_peaks_height_and_distance() {
        let mut data = vec![0.0f32; 200];
        data[50] = 5.0;
        data[55] = 8.0; // taller neighbor within distance
        data[150] = 6.0;

        let peaks = find_peaks(&data, 1.0, 50);
        assert_eq!(peaks, vec![55, 150]);

        // Height filter
        let peaks = find_peaks(&data, 7.0, 1);
        assert_eq!(peaks, vec![55]);
    }

    #[test]
    fn test_find_peaks_ignores_endpoints() {
        let data = vec![9.0, 1.0, 0.0, 1.0, 9.0];
        assert!(find_peaks(&data, 0.5, 1).is_empty());
    }

    #[test]
    fn test_zscore_flat_window_no_detection() {
        let mut detector = ZScoreDetector::new(3.0);
        let window = window_from(vec![42.0; 256], 0.0);

        let result = detector.detect(&window, 0).unwrap();
        assert!(result.is_none());
        assert_eq!(detector.degenerate_windows(), 1);
    }

    #[test]
    fn test_zscore_spike_detected_at_sample_accurate_time() {
        let mut detector = ZScoreDetector::new(3.0);
        let mut data = vec![0.0f32; 256];
        data[128] = 300.0;
        let window = window_from(data, 0.0);

        let event = detector.detect(&window, 0).unwrap().unwrap();
        assert_eq!(event.channel, 0);
        assert!((event.timestamp - 0.5).abs() < 1e-9);
        assert!(event.metric > 3.0);
    }

    #[test]
    fn test_zscore_single_event_per_window() {
        let mut detector = ZScoreDetector::new(3.0);
        let mut data = vec![0.0f32; 256];
        data[60] = 250.0;
        data[200] = 300.0;
        let window = window_from(data, 0.0);

        // Both spikes exceed the threshold; only one event is emitted
        assert!(detector.detect(&window, 0).unwrap().is_some());
    }

    #[test]
    fn test_zscore_small_wiggle_not_detected() {
        let mut detector = ZScoreDetector::new(3.0);
        let data: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 5.0 * i as f32 / FS).sin())
            .collect();
        let window = window_from(data, 0.0);

        // A clean sinusoid has no outlier derivative
        assert!(detector.detect(&window, 0).unwrap().is_none());
    }

    #[test]
    fn test_peak_detector_spike() {
        let filter = ZeroPhaseFilter::bandpass(1.0, 10.0, 4, FS).unwrap();
        let mut detector = PeakDetector::new(filter, 10.0, 50);

        let mut data = vec![0.0f32; 256];
        data[128] = 300.0;
        let window = window_from(data, 0.0);

        let event = detector.detect(&window, 0).unwrap().unwrap();
        // Zero-phase filtering keeps the smoothed spike centered
        assert!(
            (event.timestamp - 0.5).abs() <= 2.0 / FS as f64,
            "event at {}s, expected ~0.5s",
            event.timestamp
        );
        assert!(event.metric >= 10.0);
    }

    #[test]
    fn test_peak_detector_quiet_window() {
        let filter = ZeroPhaseFilter::bandpass(1.0, 10.0, 4, FS).unwrap();
        let mut detector = PeakDetector::new(filter, 100.0, 50);

        let window = window_from(vec![0.0; 256], 0.0);
        assert!(detector.detect(&window, 0).unwrap().is_none());
    }

    #[test]
    fn test_peak_detector_short_window_errors() {
        let filter = ZeroPhaseFilter::bandpass(1.0, 10.0, 4, FS).unwrap();
        let min = filter.min_samples();
        let mut detector = PeakDetector::new(filter, 100.0, 50);

        let window = window_from(vec![0.0; min - 1], 0.0);
        match detector.detect(&window, 0) {
            Err(NedError::InsufficientData { .. }) => {}
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_refractory_gate() {
        let mut gate = RefractoryGate::new(0.3);

        assert!(gate.allow(0, 1.0));
        gate.record(0, 1.0);

        // Within the period: suppressed
        assert!(!gate.allow(0, 1.2));
        // Exactly at the boundary and beyond: accepted
        assert!(gate.allow(0, 1.3));
        assert!(gate.allow(0, 2.0));

        // Other channels are independent
        assert!(gate.allow(1, 1.05));

        gate.reset();
        assert!(gate.allow(0, 1.01));
    }
}
