//! Sample source contract
//!
//! Stream discovery and connection bootstrapping stay with the caller; the
//! pipeline only ever sees a handle implementing [`SampleSource`], never a
//! global inlet.

use crate::error::NedResult;
use crate::sample::Sample;
use std::time::Duration;

/// Pull-based supplier of timestamped samples
pub trait SampleSource {
    /// Wait up to `timeout` for the next sample.
    ///
    /// Returns `Ok(Some(sample))` when one arrived, `Ok(None)` when the
    /// bounded wait elapsed with nothing available, and
    /// `Err(NedError::SourceClosed)` once the source is permanently gone.
    fn pull(&mut self, timeout: Duration) -> NedResult<Option<Sample>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NedError;

    struct CountdownSource {
        remaining: usize,
    }

    impl SampleSource for CountdownSource {
        fn pull(&mut self, _timeout: Duration) -> NedResult<Option<Sample>> {
            if self.remaining == 0 {
                return Err(NedError::SourceClosed);
            }
            self.remaining -= 1;
            Ok(Some(Sample::mono(1.0, 0.0)))
        }
    }

    #[test]
    fn test_source_contract() {
        let mut source = CountdownSource { remaining: 2 };
        assert!(source.pull(Duration::from_millis(1)).unwrap().is_some());
        assert!(source.pull(Duration::from_millis(1)).unwrap().is_some());
        assert_eq!(
            source.pull(Duration::from_millis(1)),
            Err(NedError::SourceClosed)
        );
    }
}
