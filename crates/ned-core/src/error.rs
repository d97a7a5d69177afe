//! Error handling for the NED workspace
//!
//! One error type shared by every crate; variants map to the failure
//! modes of a pull-driven acquisition loop.

use core::fmt;

/// Result type alias for NED operations
pub type NedResult<T> = Result<T, NedError>;

/// Error type for all NED operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NedError {
    /// Invalid sampling rate for the stream
    InvalidSamplingRate {
        /// Provided sampling rate in Hz
        rate: f32,
        /// Valid range description
        valid_range: String,
    },

    /// Channel count outside supported range
    InvalidChannelCount {
        /// Requested channel count
        count: usize,
        /// Maximum supported channels
        max: usize,
    },

    /// Channel index out of bounds
    InvalidChannel {
        /// Requested channel index
        index: usize,
        /// Number of channels available
        count: usize,
    },

    /// Malformed signal payload (length/shape mismatch)
    InvalidSignalData {
        /// Description of the problem
        reason: String,
    },

    /// Window too short for the requested operation
    ///
    /// Zero-phase filtering needs a minimum number of samples; the caller
    /// should accumulate more before retrying.
    InsufficientData {
        /// Minimum sample count required
        required: usize,
        /// Sample count actually available
        actual: usize,
    },

    /// The source has yielded nothing for longer than the grace period
    ///
    /// Non-fatal: the pipeline pauses and resumes once samples arrive.
    NoSignal {
        /// Seconds elapsed since the last sample
        elapsed: f32,
    },

    /// The source is permanently gone; terminal for the acquisition loop
    SourceClosed,

    /// Invalid pipeline or detector configuration
    ConfigurationError {
        /// Configuration error description
        message: String,
    },

    /// Signal processing failure
    ProcessingError {
        /// Processing error description
        message: String,
    },

    /// Signal simulation failure
    SimulationError {
        /// Simulation error description
        message: String,
    },

    /// Serialization/deserialization failure
    SerializationError {
        /// Serialization error description
        message: String,
    },
}

impl fmt::Display for NedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NedError::InvalidSamplingRate { rate, valid_range } => {
                write!(f, "Invalid sampling rate: {}Hz, valid range: {}", rate, valid_range)
            }
            NedError::InvalidChannelCount { count, max } => {
                write!(f, "Invalid channel count: {}, max supported {}", count, max)
            }
            NedError::InvalidChannel { index, count } => {
                write!(f, "Channel index {} out of bounds ({} channels)", index, count)
            }
            NedError::InvalidSignalData { reason } => {
                write!(f, "Invalid signal data: {}", reason)
            }
            NedError::InsufficientData { required, actual } => {
                write!(f, "Insufficient data: {} samples required, {} available",
                       required, actual)
            }
            NedError::NoSignal { elapsed } => {
                write!(f, "No signal: source silent for {:.2}s", elapsed)
            }
            NedError::SourceClosed => {
                write!(f, "Sample source closed")
            }
            NedError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            NedError::ProcessingError { message } => {
                write!(f, "Processing error: {}", message)
            }
            NedError::SimulationError { message } => {
                write!(f, "Simulation error: {}", message)
            }
            NedError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for NedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = NedError::InsufficientData {
            required: 27,
            actual: 10,
        };
        let display = format!("{}", error);
        assert!(display.contains("Insufficient data"));
        assert!(display.contains("27"));
        assert!(display.contains("10"));
    }

    #[test]
    fn test_no_signal_display() {
        let error = NedError::NoSignal { elapsed: 2.5 };
        assert!(format!("{}", error).contains("2.50s"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = NedError::SourceClosed;
        let error2 = NedError::SourceClosed;
        assert_eq!(error1, error2);

        let error3 = NedError::InvalidChannel { index: 4, count: 4 };
        let error4 = NedError::InvalidChannel { index: 4, count: 4 };
        assert_eq!(error3, error4);
    }
}
