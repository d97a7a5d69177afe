//! Sliding-window buffering over a live sample stream

use ned_core::{EegMetadata, NedError, NedResult, Sample, WindowEntity};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// What happens to the buffer after a window completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPolicy {
    /// Advance by `hop` samples; consecutive windows overlap by
    /// `frame - hop` samples. `hop = 1` re-evaluates on every new sample.
    Slide { hop: usize },
    /// Empty the buffer; consecutive windows never overlap.
    Clear,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        WindowPolicy::Slide { hop: 1 }
    }
}

/// Accumulates pulled samples into fixed-size analysis windows
///
/// One ring buffer per channel plus a shared timestamp queue. Arrival
/// order is preserved. Non-finite samples and samples whose channel count
/// doesn't match the stream are dropped silently: they are counted,
/// logged at debug level, and never abort the loop.
pub struct WindowAssembler {
    metadata: EegMetadata,
    frame_samples: usize,
    policy: WindowPolicy,
    buffers: Vec<VecDeque<f32>>,
    timestamps: VecDeque<f64>,
    dropped: u64,
}

impl WindowAssembler {
    /// Create a new assembler producing windows of `frame_samples` per channel
    pub fn new(
        metadata: EegMetadata,
        frame_samples: usize,
        policy: WindowPolicy,
    ) -> NedResult<Self> {
        if frame_samples < 2 {
            return Err(NedError::ConfigurationError {
                message: format!("Frame size {} too small, need at least 2", frame_samples),
            });
        }
        if let WindowPolicy::Slide { hop } = policy {
            if hop == 0 || hop > frame_samples {
                return Err(NedError::ConfigurationError {
                    message: format!(
                        "Slide hop {} must be between 1 and the frame size {}",
                        hop, frame_samples
                    ),
                });
            }
        }

        let buffers = vec![VecDeque::with_capacity(frame_samples); metadata.channel_count];

        Ok(WindowAssembler {
            metadata,
            frame_samples,
            policy,
            buffers,
            timestamps: VecDeque::with_capacity(frame_samples),
            dropped: 0,
        })
    }

    /// Push one sample; returns the completed window once the frame fills
    pub fn push(&mut self, sample: &Sample) -> Option<WindowEntity> {
        if !sample.is_finite() {
            self.dropped += 1;
            debug!(dropped = self.dropped, "skipping non-finite sample");
            return None;
        }
        if sample.channel_count() != self.metadata.channel_count {
            self.dropped += 1;
            debug!(
                expected = self.metadata.channel_count,
                got = sample.channel_count(),
                "skipping sample with wrong channel count"
            );
            return None;
        }

        for (buffer, &value) in self.buffers.iter_mut().zip(sample.channels.iter()) {
            buffer.push_back(value);
        }
        self.timestamps.push_back(sample.timestamp);

        if self.timestamps.len() < self.frame_samples {
            return None;
        }

        self.emit()
    }

    /// Build the completed window and advance the buffer per policy
    fn emit(&mut self) -> Option<WindowEntity> {
        let channel_count = self.metadata.channel_count;
        let mut data = Vec::with_capacity(self.frame_samples * channel_count);
        for sample_idx in 0..self.frame_samples {
            for buffer in &self.buffers {
                data.push(buffer[sample_idx]);
            }
        }
        let start_time = *self.timestamps.front().unwrap_or(&0.0);

        match self.policy {
            WindowPolicy::Clear => {
                for buffer in &mut self.buffers {
                    buffer.clear();
                }
                self.timestamps.clear();
            }
            WindowPolicy::Slide { hop } => {
                for buffer in &mut self.buffers {
                    buffer.drain(..hop);
                }
                self.timestamps.drain(..hop);
            }
        }

        // Shape is valid by construction
        WindowEntity::new(data, self.metadata.clone(), start_time).ok()
    }

    /// Samples currently buffered per channel
    pub fn fill(&self) -> usize {
        self.timestamps.len()
    }

    /// Samples dropped because they were invalid
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discard all buffered samples
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
        self.timestamps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(channels: usize) -> EegMetadata {
        EegMetadata::new(256.0, channels, vec![]).unwrap()
    }

    fn sample(value: f32, index: usize) -> Sample {
        Sample::mono(value, index as f64 / 256.0)
    }

    #[test]
    fn test_window_completes_at_frame_size() {
        let mut assembler = WindowAssembler::new(meta(1), 4, WindowPolicy::Clear).unwrap();

        for i in 0..3 {
            assert!(assembler.push(&sample(i as f32, i)).is_none());
        }
        let window = assembler.push(&sample(3.0, 3)).unwrap();

        assert_eq!(window.channel_data(0).unwrap(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(window.start_time, 0.0);
        assert_eq!(assembler.fill(), 0); // cleared
    }

    #[test]
    fn test_sliding_policy_overlaps() {
        let mut assembler =
            WindowAssembler::new(meta(1), 4, WindowPolicy::Slide { hop: 1 }).unwrap();

        for i in 0..3 {
            assert!(assembler.push(&sample(i as f32, i)).is_none());
        }
        let first = assembler.push(&sample(3.0, 3)).unwrap();
        assert_eq!(first.channel_data(0).unwrap(), vec![0.0, 1.0, 2.0, 3.0]);

        // One more sample immediately completes the next overlapping window
        let second = assembler.push(&sample(4.0, 4)).unwrap();
        assert_eq!(second.channel_data(0).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!((second.start_time - 1.0 / 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_slide_hop_advances_by_hop() {
        let mut assembler =
            WindowAssembler::new(meta(1), 4, WindowPolicy::Slide { hop: 2 }).unwrap();

        for i in 0..4 {
            assembler.push(&sample(i as f32, i));
        }
        assert_eq!(assembler.fill(), 2);

        assembler.push(&sample(4.0, 4));
        let window = assembler.push(&sample(5.0, 5)).unwrap();
        assert_eq!(window.channel_data(0).unwrap(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_invalid_samples_dropped_silently() {
        let mut assembler = WindowAssembler::new(meta(1), 3, WindowPolicy::Clear).unwrap();

        assembler.push(&sample(1.0, 0));
        assert!(assembler.push(&Sample::mono(f32::NAN, 0.1)).is_none());
        assert!(assembler
            .push(&Sample::new(vec![1.0, 2.0], 0.2)) // wrong channel count
            .is_none());
        assert_eq!(assembler.dropped(), 2);
        assert_eq!(assembler.fill(), 1);

        // The window still completes from valid samples only
        assembler.push(&sample(2.0, 2));
        assert!(assembler.push(&sample(3.0, 3)).is_some());
    }

    #[test]
    fn test_multichannel_interleaving() {
        let meta = EegMetadata::new(256.0, 2, vec![]).unwrap();
        let mut assembler = WindowAssembler::new(meta, 2, WindowPolicy::Clear).unwrap();

        assembler.push(&Sample::new(vec![1.0, 10.0], 0.0));
        let window = assembler.push(&Sample::new(vec![2.0, 20.0], 1.0 / 256.0)).unwrap();

        assert_eq!(window.channel_data(0).unwrap(), vec![1.0, 2.0]);
        assert_eq!(window.channel_data(1).unwrap(), vec![10.0, 20.0]);
    }

    #[test]
    fn test_bad_config_rejected() {
        assert!(WindowAssembler::new(meta(1), 1, WindowPolicy::Clear).is_err());
        assert!(WindowAssembler::new(meta(1), 8, WindowPolicy::Slide { hop: 0 }).is_err());
        assert!(WindowAssembler::new(meta(1), 8, WindowPolicy::Slide { hop: 9 }).is_err());
    }
}
