//! WindowEntity: container for one completed analysis window

use crate::eeg_types::EegMetadata;
use crate::error::{NedError, NedResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed analysis window over an EEG stream
///
/// Holds the most recent `frame` of samples for every channel, interleaved
/// `[ch0_s0, ch1_s0, ch0_s1, ch1_s1, ...]`, together with the stream
/// metadata and the timestamp of its oldest sample.
#[derive(Debug, Clone)]
pub struct WindowEntity {
    /// Unique identifier for this window
    pub id: Uuid,
    /// Window data (interleaved channels)
    pub data: Vec<f32>,
    /// Stream metadata
    pub metadata: EegMetadata,
    /// Timestamp of the first sample in the window, in seconds
    pub start_time: f64,
}

impl WindowEntity {
    /// Create new window entity from interleaved data
    pub fn new(data: Vec<f32>, metadata: EegMetadata, start_time: f64) -> NedResult<Self> {
        if data.is_empty() {
            return Err(NedError::InvalidSignalData {
                reason: "Window data is empty".to_string(),
            });
        }
        if data.len() % metadata.channel_count != 0 {
            return Err(NedError::InvalidSignalData {
                reason: format!(
                    "Data length {} is not a multiple of channel count {}",
                    data.len(),
                    metadata.channel_count
                ),
            });
        }

        Ok(WindowEntity {
            id: Uuid::new_v4(),
            data,
            metadata,
            start_time,
        })
    }

    /// Get total number of samples across all channels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.data.len() / self.metadata.channel_count
    }

    /// Get data for a specific channel
    pub fn channel_data(&self, channel_index: usize) -> NedResult<Vec<f32>> {
        if channel_index >= self.metadata.channel_count {
            return Err(NedError::InvalidChannel {
                index: channel_index,
                count: self.metadata.channel_count,
            });
        }

        let samples_per_channel = self.samples_per_channel();
        let mut channel_data = Vec::with_capacity(samples_per_channel);

        // Extract interleaved channel data
        for sample_idx in 0..samples_per_channel {
            let data_idx = sample_idx * self.metadata.channel_count + channel_index;
            channel_data.push(self.data[data_idx]);
        }

        Ok(channel_data)
    }

    /// Get all channel data as separate vectors
    pub fn all_channels(&self) -> NedResult<Vec<Vec<f32>>> {
        let mut channels = Vec::with_capacity(self.metadata.channel_count);

        for ch in 0..self.metadata.channel_count {
            channels.push(self.channel_data(ch)?);
        }

        Ok(channels)
    }

    /// Window duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples_per_channel() as f32 / self.metadata.sampling_rate
    }

    /// Get sampling rate
    pub fn sampling_rate(&self) -> f32 {
        self.metadata.sampling_rate
    }

    /// Get channel count
    pub fn channel_count(&self) -> usize {
        self.metadata.channel_count
    }

    /// Timestamp of the sample at `index` within this window
    pub fn time_at(&self, index: usize) -> f64 {
        self.start_time + index as f64 / self.metadata.sampling_rate as f64
    }

    /// Get time vector relative to the window start
    pub fn time_vector(&self) -> Vec<f32> {
        let samples = self.samples_per_channel();
        let dt = 1.0 / self.metadata.sampling_rate;

        (0..samples).map(|i| i as f32 * dt).collect()
    }

    /// Calculate basic statistics for a channel
    pub fn channel_stats(&self, channel_index: usize) -> NedResult<ChannelStats> {
        let data = self.channel_data(channel_index)?;
        Ok(ChannelStats::calculate(&data))
    }
}

/// Basic statistics for a signal channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f32,
    pub rms: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
    pub peak_to_peak: f32,
}

impl ChannelStats {
    pub fn calculate(data: &[f32]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let sum: f32 = data.iter().sum();
        let mean = sum / data.len() as f32;

        let sum_sq: f32 = data.iter().map(|x| x * x).sum();
        let rms = (sum_sq / data.len() as f32).sqrt();

        let variance: f32 = data.iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f32>() / data.len() as f32;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let peak_to_peak = max - min;

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_entity_creation() {
        let metadata = EegMetadata::new(256.0, 1, vec![]).unwrap();
        let data = vec![0.0; 512]; // 2 seconds at 256 Hz
        let window = WindowEntity::new(data, metadata, 0.0).unwrap();

        assert_eq!(window.len(), 512);
        assert_eq!(window.samples_per_channel(), 512);
        assert_eq!(window.channel_count(), 1);
        assert!((window.duration() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_multichannel_window() {
        let metadata = EegMetadata::new(256.0, 2, vec![]).unwrap();

        // Interleaved data: [ch0_sample0, ch1_sample0, ch0_sample1, ...]
        let data = (0..512).map(|i| i as f32).collect();
        let window = WindowEntity::new(data, metadata, 1.5).unwrap();

        assert_eq!(window.samples_per_channel(), 256);

        let ch0 = window.channel_data(0).unwrap();
        let ch1 = window.channel_data(1).unwrap();

        assert_eq!(ch0.len(), 256);
        assert_eq!(ch1.len(), 256);

        // Check interleaving
        assert_eq!(ch0[0], 0.0);
        assert_eq!(ch1[0], 1.0);
        assert_eq!(ch0[1], 2.0);
        assert_eq!(ch1[1], 3.0);

        // Channel out of bounds
        assert!(window.channel_data(2).is_err());
    }

    #[test]
    fn test_time_mapping() {
        let metadata = EegMetadata::new(256.0, 1, vec![]).unwrap();
        let window = WindowEntity::new(vec![0.0; 256], metadata, 10.0).unwrap();

        assert!((window.time_at(0) - 10.0).abs() < 1e-9);
        assert!((window.time_at(128) - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_ragged_data_rejected() {
        let metadata = EegMetadata::new(256.0, 2, vec![]).unwrap();
        assert!(WindowEntity::new(vec![0.0; 511], metadata.clone(), 0.0).is_err());
        assert!(WindowEntity::new(vec![], metadata, 0.0).is_err());
    }

    #[test]
    fn test_channel_stats() {
        let data = vec![1.0, -1.0, 1.0, -1.0];
        let stats = ChannelStats::calculate(&data);

        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.rms, 1.0);
        assert_eq!(stats.std_dev, 1.0);
        assert_eq!(stats.peak_to_peak, 2.0);
    }
}
