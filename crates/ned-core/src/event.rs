//! Detection events and the sink contract

use serde::{Deserialize, Serialize};

/// One discrete detection emitted by the pipeline
///
/// Created the instant its triggering condition is satisfied and handed
/// straight to the sink; nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Channel the event fired on
    pub channel: usize,
    /// Event timestamp in seconds, sample-accurate within its window
    pub timestamp: f64,
    /// Detection metric: z-score or filtered peak height, per strategy
    pub metric: f32,
}

impl DetectionEvent {
    pub fn new(channel: usize, timestamp: f64, metric: f32) -> Self {
        DetectionEvent {
            channel,
            timestamp,
            metric,
        }
    }
}

impl std::fmt::Display for DetectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "event on channel {} at {:.2}s (metric {:.2})",
            self.channel, self.timestamp, self.metric
        )
    }
}

/// Consumer of detection events
///
/// Typical implementations annotate a live chart or write a log line;
/// the pipeline calls this synchronously after the refractory gate.
pub trait EventSink {
    fn on_event(&mut self, event: &DetectionEvent);
}

/// Collects events into a vector; useful in tests and batch runs.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub events: Vec<DetectionEvent>,
}

impl EventSink for CollectSink {
    fn on_event(&mut self, event: &DetectionEvent) {
        self.events.push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = DetectionEvent::new(1, 12.34, 4.02);
        let display = format!("{}", event);
        assert!(display.contains("channel 1"));
        assert!(display.contains("12.34s"));
        assert!(display.contains("4.02"));
    }

    #[test]
    fn test_collect_sink() {
        let mut sink = CollectSink::default();
        sink.on_event(&DetectionEvent::new(0, 0.5, 11.3));
        sink.on_event(&DetectionEvent::new(0, 1.0, 3.6));
        assert_eq!(sink.events.len(), 2);
        assert_eq!(sink.events[0].timestamp, 0.5);
    }
}
