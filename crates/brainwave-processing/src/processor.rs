//! Analysis chain: spectrum, band aggregation, classification

use crate::bands::aggregate;
use crate::classifier::StateClassifier;
use crate::config::AnalysisConfig;
use crate::spectrum::{InsufficientData, SpectralAnalyzer};
use brainwave_core::{AnalysisSnapshot, BrainwaveResult, ChannelHistory};
use chrono::Utc;
use std::time::Instant;

/// Timing and outcome of one analysis cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleMetrics {
    /// Wall time spent in the chain, microseconds
    pub processing_time_us: u64,
    /// Samples per channel that went into the spectrum
    pub input_samples: usize,
    /// Bins in the non-negative half spectrum
    pub spectrum_bins: usize,
    /// Set when the cycle produced no snapshot
    pub skipped: Option<InsufficientData>,
}

/// Result of running the chain once
#[derive(Debug, Clone)]
pub struct CycleOutput {
    /// New snapshot, `None` when the cycle was skipped
    pub snapshot: Option<AnalysisSnapshot>,
    pub metrics: CycleMetrics,
}

/// Runs Spectral Analyzer, Band Power Aggregator and State Classifier in
/// sequence on a buffer snapshot.
pub struct BrainwaveProcessor {
    analyzer: SpectralAnalyzer,
    classifier: StateClassifier,
    cycles: u64,
}

impl BrainwaveProcessor {
    pub fn new(config: &AnalysisConfig) -> BrainwaveResult<Self> {
        config.validate()?;

        Ok(BrainwaveProcessor {
            analyzer: SpectralAnalyzer::new(config.sample_rate),
            classifier: StateClassifier::from_config(config),
            cycles: 0,
        })
    }

    /// Number of snapshots produced so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn classifier(&self) -> &StateClassifier {
        &self.classifier
    }

    /// Analyze a buffer snapshot.
    ///
    /// Degenerate input (empty, unequal or too-short buffers) never errors:
    /// the cycle is reported as skipped and no snapshot is produced.
    pub fn process(&mut self, history: ChannelHistory) -> CycleOutput {
        let start = Instant::now();
        let input_samples = history.channels().first().map(Vec::len).unwrap_or(0);

        let spectrum = match self.analyzer.analyze(&history) {
            Ok(spectrum) => spectrum,
            Err(reason) => {
                return CycleOutput {
                    snapshot: None,
                    metrics: CycleMetrics {
                        processing_time_us: start.elapsed().as_micros() as u64,
                        input_samples,
                        spectrum_bins: 0,
                        skipped: Some(reason),
                    },
                };
            }
        };

        let bands = aggregate(&spectrum);
        let dominant_state = self.classifier.classify(&bands.ranking);
        self.cycles += 1;

        let snapshot = AnalysisSnapshot {
            cycle: self.cycles,
            analyzed_at: Some(Utc::now()),
            band_powers: bands.powers,
            band_ranking: bands.ranking,
            band_percentages: bands.percentages,
            dominant_state,
            raw_data: history,
        };

        CycleOutput {
            snapshot: Some(snapshot),
            metrics: CycleMetrics {
                processing_time_us: start.elapsed().as_micros() as u64,
                input_samples,
                spectrum_bins: spectrum.len(),
                skipped: None,
            },
        }
    }

    /// Forget the cycle count
    pub fn reset(&mut self) {
        self.cycles = 0;
    }
}
