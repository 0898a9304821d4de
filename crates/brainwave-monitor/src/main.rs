//! Brainwave Monitor - Simulated headset → Analysis → JSON lines on stdout
//!
//! Usage: brainwave-monitor [CONFIG.json|-] [DURATION_SECS] [PATTERN]

use anyhow::{bail, Context, Result};
use brainwave_monitor::{JsonLinesSink, MonitorConfig, Pipeline};
use brainwave_simulation::{BrainwavePattern, HeadsetConfig, SimulatedHeadset};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, snapshots to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match args.first().map(String::as_str) {
        Some(path) if path != "-" => MonitorConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        _ => MonitorConfig::default(),
    };

    let duration = args
        .get(1)
        .map(|secs| secs.parse::<u64>().map(Duration::from_secs))
        .transpose()
        .context("Duration must be a whole number of seconds")?;

    let pattern = match args.get(2) {
        Some(name) => BrainwavePattern::from_name(name)
            .with_context(|| format!("Unknown brainwave pattern '{}'", name))?,
        None => BrainwavePattern::default(),
    };

    info!("Starting Brainwave Monitor ({})", config.analysis.name);
    info!("Signal flow: Simulated headset → Spectral analysis → JSON snapshots");

    let headset = SimulatedHeadset::new(HeadsetConfig {
        sample_rate: config.analysis.sample_rate,
        channel_count: config.analysis.channels.len(),
        pattern,
        ..Default::default()
    })
    .context("Invalid simulated headset configuration")?;

    let sink = Arc::new(JsonLinesSink::stdout().context("Failed to open snapshot output")?);
    let pipeline = Pipeline::new(config, Arc::new(headset), sink.clone())
        .context("Failed to build pipeline")?;

    let connected = pipeline.connect().await;
    if !connected.success {
        bail!(connected.message);
    }

    let started = pipeline.start_streaming().await;
    if !started.success {
        bail!(started.message);
    }

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => info!("Run time elapsed"),
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
    }

    let stopped = pipeline.disconnect().await;
    info!("{}", stopped);

    let analysis = pipeline.analysis_stats();
    let published = pipeline.publish_stats();
    info!(
        "Analysis cycles: {} ({} skipped, {} slow), snapshots published: {}, samples ingested: {}",
        analysis.cycles,
        analysis.skipped_cycles,
        analysis.slow_cycles,
        published.published,
        pipeline.ingest_stats().samples
    );

    // Flush snapshots still queued for stdout
    drop(pipeline);
    if let Ok(sink) = Arc::try_unwrap(sink) {
        sink.into_inner().context("Failed to flush snapshot output")?;
    }

    Ok(())
}
