//! Basic usage: simulated blink stream through the z-score pipeline
//!
//! Generates ten seconds of synthetic EEG with periodic blink bumps, runs
//! the detection pipeline over it and prints the resulting counters.

use ned_detect::{DetectionPipeline, LogSink, PipelineConfig};
use ned_core::NedError;
use ned_simulation::{NoiseConfig, EegSimulator, SignalPattern, SimulatorConfig, SyntheticSource};
use std::sync::atomic::AtomicBool;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Ten seconds of one-channel EEG with a blink bump every two seconds
    let sim_config = SimulatorConfig {
        sampling_rate: 256.0,
        channel_count: 1,
        pattern: SignalPattern::Blinks {
            interval: 2.0,
            amplitude: 250.0,
            width: 0.2,
        },
        noise: NoiseConfig {
            gaussian_std: 5.0,
            ..NoiseConfig::default()
        },
        powerline_freq: Some(50.0),
        seed: Some(7),
    };
    let mut simulator = EegSimulator::new(sim_config)?;
    let mut source = SyntheticSource::from_simulator(&mut simulator, 10.0);

    let mut pipeline = DetectionPipeline::new(PipelineConfig::blink_zscore())?;
    let mut sink = LogSink::new("blink");
    let stop = AtomicBool::new(false);

    match pipeline.run(&mut source, &mut sink, None, &stop) {
        // The synthetic recording simply ran out
        Err(NedError::SourceClosed) => {}
        Err(e) => return Err(e.into()),
        Ok(_) => {}
    }

    let stats = pipeline.stats();
    println!(
        "{} samples, {} windows, {} events ({} suppressed by the refractory gate)",
        stats.samples_seen, stats.windows_completed, stats.events_emitted, stats.events_suppressed
    );

    Ok(())
}
