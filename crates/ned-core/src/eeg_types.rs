//! EEG-specific stream types and metadata

use crate::error::{NedError, NedResult};
use serde::{Deserialize, Serialize};

/// Electrode placement for a single EEG channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectrodeSite {
    /// Left ear (Muse)
    Tp9,
    /// Left forehead (Muse)
    Af7,
    /// Right forehead (Muse)
    Af8,
    /// Right ear (Muse)
    Tp10,
    /// Forehead reference
    Fpz,
    /// Auxiliary input
    Aux,
    /// Any other 10-20 position, by index
    Other(u8),
}

impl ElectrodeSite {
    /// Standard Muse headband montage (TP9, AF7, AF8, TP10)
    pub fn muse_headband() -> Vec<ElectrodeSite> {
        vec![
            ElectrodeSite::Tp9,
            ElectrodeSite::Af7,
            ElectrodeSite::Af8,
            ElectrodeSite::Tp10,
        ]
    }
}

impl std::fmt::Display for ElectrodeSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectrodeSite::Tp9 => write!(f, "TP9"),
            ElectrodeSite::Af7 => write!(f, "AF7"),
            ElectrodeSite::Af8 => write!(f, "AF8"),
            ElectrodeSite::Tp10 => write!(f, "TP10"),
            ElectrodeSite::Fpz => write!(f, "FPz"),
            ElectrodeSite::Aux => write!(f, "AUX"),
            ElectrodeSite::Other(id) => write!(f, "Other({})", id),
        }
    }
}

/// EEG stream metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EegMetadata {
    /// Sampling rate in Hz
    pub sampling_rate: f32,
    /// Number of channels
    pub channel_count: usize,
    /// Electrode sites, in channel order (may be empty when unknown)
    pub sites: Vec<ElectrodeSite>,
}

impl EegMetadata {
    /// Create new EEG metadata
    pub fn new(
        sampling_rate: f32,
        channel_count: usize,
        sites: Vec<ElectrodeSite>,
    ) -> NedResult<Self> {
        Self::validate_sampling_rate(sampling_rate)?;
        Self::validate_channel_count(channel_count)?;

        if !sites.is_empty() && sites.len() != channel_count {
            return Err(NedError::InvalidSignalData {
                reason: format!(
                    "Site list length {} doesn't match channel count {}",
                    sites.len(),
                    channel_count
                ),
            });
        }

        Ok(EegMetadata {
            sampling_rate,
            channel_count,
            sites,
        })
    }

    /// Metadata for a Muse 2 headband stream (256 Hz, 4 channels)
    pub fn muse() -> Self {
        EegMetadata {
            sampling_rate: 256.0,
            channel_count: 4,
            sites: ElectrodeSite::muse_headband(),
        }
    }

    /// Validate sampling rate for consumer EEG streams
    pub fn validate_sampling_rate(rate: f32) -> NedResult<()> {
        const MIN_RATE: f32 = 64.0;
        const MAX_RATE: f32 = 2048.0;

        if rate < MIN_RATE || rate > MAX_RATE {
            Err(NedError::InvalidSamplingRate {
                rate,
                valid_range: format!("{}-{}Hz", MIN_RATE, MAX_RATE),
            })
        } else {
            Ok(())
        }
    }

    /// Validate channel count for EEG streams
    pub fn validate_channel_count(count: usize) -> NedResult<()> {
        const MAX_CHANNELS: usize = 32;

        if count == 0 || count > MAX_CHANNELS {
            Err(NedError::InvalidChannelCount {
                count,
                max: MAX_CHANNELS,
            })
        } else {
            Ok(())
        }
    }

    /// Label for a channel: its electrode site when known, otherwise the index
    pub fn channel_label(&self, channel: usize) -> String {
        match self.sites.get(channel) {
            Some(site) => site.to_string(),
            None => format!("ch{}", channel),
        }
    }

    /// Nyquist frequency of the stream
    pub fn nyquist(&self) -> f32 {
        self.sampling_rate / 2.0
    }
}

impl Default for EegMetadata {
    fn default() -> Self {
        Self::muse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muse_metadata() {
        let meta = EegMetadata::muse();
        assert_eq!(meta.sampling_rate, 256.0);
        assert_eq!(meta.channel_count, 4);
        assert_eq!(meta.channel_label(1), "AF7");
        assert_eq!(meta.channel_label(2), "AF8");
        assert_eq!(meta.nyquist(), 128.0);
    }

    #[test]
    fn test_sampling_rate_validation() {
        assert!(EegMetadata::validate_sampling_rate(256.0).is_ok());
        assert!(EegMetadata::validate_sampling_rate(1000.0).is_ok());
        assert!(EegMetadata::validate_sampling_rate(10.0).is_err());
        assert!(EegMetadata::validate_sampling_rate(10_000.0).is_err());
    }

    #[test]
    fn test_channel_count_validation() {
        assert!(EegMetadata::validate_channel_count(1).is_ok());
        assert!(EegMetadata::validate_channel_count(32).is_ok());
        assert!(EegMetadata::validate_channel_count(0).is_err());
        assert!(EegMetadata::validate_channel_count(64).is_err());
    }

    #[test]
    fn test_site_list_must_match() {
        let result = EegMetadata::new(256.0, 2, ElectrodeSite::muse_headband());
        assert!(result.is_err());

        let ok = EegMetadata::new(256.0, 2, vec![]).unwrap();
        assert_eq!(ok.channel_label(0), "ch0");
    }
}
