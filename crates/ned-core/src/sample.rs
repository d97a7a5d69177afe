//! Single timestamped multi-channel sample

use serde::{Deserialize, Serialize};

/// One multi-channel amplitude reading pulled from a stream
///
/// Amplitudes are in the source's native unit (conventionally microvolts);
/// the timestamp is in seconds on the source's clock. Delivery is
/// pull-based, so consecutive timestamps may jitter around 1/fs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Per-channel amplitudes
    pub channels: Vec<f32>,
    /// Acquisition timestamp in seconds
    pub timestamp: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(channels: Vec<f32>, timestamp: f64) -> Self {
        Sample { channels, timestamp }
    }

    /// Single-channel convenience constructor
    pub fn mono(value: f32, timestamp: f64) -> Self {
        Sample {
            channels: vec![value],
            timestamp,
        }
    }

    /// Number of channels carried by this sample
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Amplitude for one channel, if present
    pub fn channel(&self, index: usize) -> Option<f32> {
        self.channels.get(index).copied()
    }

    /// True when every amplitude and the timestamp are finite
    ///
    /// Sources occasionally deliver NaN padding for dropped readings;
    /// buffering layers skip such samples instead of crashing on them.
    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.channels.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_accessors() {
        let sample = Sample::new(vec![1.0, -2.5, 3.0], 0.5);
        assert_eq!(sample.channel_count(), 3);
        assert_eq!(sample.channel(1), Some(-2.5));
        assert_eq!(sample.channel(3), None);
        assert!(sample.is_finite());
    }

    #[test]
    fn test_nan_sample_is_not_finite() {
        let sample = Sample::new(vec![1.0, f32::NAN], 0.5);
        assert!(!sample.is_finite());

        let sample = Sample::mono(1.0, f64::INFINITY);
        assert!(!sample.is_finite());
    }
}
