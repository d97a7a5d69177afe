//! Sample sources: deterministic for tests, tokio-paced for live runs

use crate::eeg_simulator::EegSimulator;
use crate::signal_patterns::SignalPattern;
use ned_core::{NedError, NedResult, Sample, SampleSource};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use tokio::sync::mpsc;

/// Deterministic, instant sample source
///
/// Plays back a prerecorded queue without real-time delays so pipeline
/// behavior is testable synchronously. Queue entries may be gaps, which
/// behave like a timed-out pull; an exhausted queue reports the source as
/// closed.
#[derive(Debug, Default)]
pub struct SyntheticSource {
    queue: VecDeque<Option<Sample>>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source playing back the given samples in order
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        SyntheticSource {
            queue: samples.into_iter().map(Some).collect(),
        }
    }

    /// Source playing back `duration` seconds of simulator output
    pub fn from_simulator(simulator: &mut EegSimulator, duration: f32) -> Self {
        Self::from_samples(simulator.generate(duration))
    }

    /// Append one sample to the playback queue
    pub fn push_sample(&mut self, sample: Sample) {
        self.queue.push_back(Some(sample));
    }

    /// Append one gap: the next pull times out instead of yielding data
    pub fn push_gap(&mut self) {
        self.queue.push_back(None);
    }

    /// Queue entries left to play back
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SampleSource for SyntheticSource {
    fn pull(&mut self, _timeout: Duration) -> NedResult<Option<Sample>> {
        match self.queue.pop_front() {
            Some(Some(sample)) => Ok(Some(sample)),
            Some(None) => Ok(None),
            None => Err(NedError::SourceClosed),
        }
    }
}

/// Commands for controlling a live stream
#[derive(Debug, Clone)]
pub enum StreamCommand {
    Start,
    Stop,
    Pause,
    Resume,
    SetPattern(SignalPattern),
}

/// Configuration for real-time streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// EEG simulation configuration
    pub simulator: crate::eeg_simulator::SimulatorConfig,
    /// Emit samples immediately instead of waiting for `Start`
    pub autostart: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            simulator: crate::eeg_simulator::SimulatorConfig::default(),
            autostart: false,
        }
    }
}

/// Real-time EEG sample stream
///
/// A tokio task paces an [`EegSimulator`] at the stream's sampling rate
/// and hands samples to the synchronous consumer over a single-producer/
/// single-consumer channel. `Stop` (or dropping the command sender) ends
/// the task and closes the channel, which the consumer observes as
/// `SourceClosed`.
pub struct RealTimeEegStream {
    simulator: EegSimulator,
    sample_sender: std::sync::mpsc::Sender<Sample>,
    control_receiver: mpsc::Receiver<StreamCommand>,
    running: bool,
}

impl RealTimeEegStream {
    /// Create the stream with its inlet and control handle
    pub fn new(
        config: StreamConfig,
    ) -> NedResult<(Self, EegStreamInlet, mpsc::Sender<StreamCommand>)> {
        let simulator = EegSimulator::new(config.simulator)?;
        let (sample_sender, sample_receiver) = std::sync::mpsc::channel();
        let (control_sender, control_receiver) = mpsc::channel(32);

        let stream = RealTimeEegStream {
            simulator,
            sample_sender,
            control_receiver,
            running: config.autostart,
        };
        let inlet = EegStreamInlet {
            receiver: sample_receiver,
        };

        Ok((stream, inlet, control_sender))
    }

    /// Pace the simulator until stopped or the consumer goes away
    pub async fn run(mut self) -> NedResult<()> {
        let dt = Duration::from_secs_f32(1.0 / self.simulator.metadata().sampling_rate);
        let mut ticker = tokio::time::interval(dt);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.running {
                        let sample = self.simulator.next_sample();
                        if self.sample_sender.send(sample).is_err() {
                            // Consumer dropped the inlet
                            break;
                        }
                    }
                }

                command = self.control_receiver.recv() => {
                    match command {
                        Some(StreamCommand::Start) | Some(StreamCommand::Resume) => {
                            self.running = true;
                        }
                        Some(StreamCommand::Pause) => {
                            self.running = false;
                        }
                        Some(StreamCommand::SetPattern(pattern)) => {
                            self.simulator.set_pattern(pattern);
                        }
                        Some(StreamCommand::Stop) | None => break,
                    }
                }
            }
        }

        Ok(())
    }
}

/// Consumer end of a real-time stream
pub struct EegStreamInlet {
    receiver: std::sync::mpsc::Receiver<Sample>,
}

impl SampleSource for EegStreamInlet {
    fn pull(&mut self, timeout: Duration) -> NedResult<Option<Sample>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(sample) => Ok(Some(sample)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(NedError::SourceClosed),
        }
    }
}

/// Create a stream and run it as a background task
pub fn spawn_eeg_stream(
    config: StreamConfig,
) -> NedResult<(EegStreamInlet, mpsc::Sender<StreamCommand>)> {
    let (stream, inlet, control_sender) = RealTimeEegStream::new(config)?;

    tokio::spawn(async move {
        if let Err(e) = stream.run().await {
            eprintln!("EEG stream error: {}", e);
        }
    });

    Ok((inlet, control_sender))
}
