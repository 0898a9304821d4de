//! Simulated EEG headset with wall-clock paced sample delivery

use crate::signal_patterns::BrainwavePattern;
use brainwave_core::{
    config_error, BrainwaveError, BrainwaveResult, SampleInlet, StreamInfo, StreamResolver,
};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Configuration for the simulated headset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadsetConfig {
    /// Stream name reported on discovery
    pub name: String,
    /// Sampling rate in Hz
    pub sample_rate: f32,
    /// Number of channels per sample
    pub channel_count: usize,
    /// Brain state to synthesize
    pub pattern: BrainwavePattern,
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub noise_std: f32,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// When false, discovery always times out
    pub discoverable: bool,
    /// Time discovery takes before the headset shows up
    pub discovery_latency_ms: u64,
    /// Report a disconnect after this many samples
    pub drop_after_samples: Option<u64>,
    /// Upper bound on samples returned by a single pull
    pub max_chunk_samples: usize,
}

impl Default for HeadsetConfig {
    fn default() -> Self {
        Self {
            name: "Simulated Muse".to_string(),
            sample_rate: 256.0,
            channel_count: 4,
            pattern: BrainwavePattern::default(),
            noise_std: 0.05,
            seed: None,
            discoverable: true,
            discovery_latency_ms: 50,
            drop_after_samples: None,
            max_chunk_samples: 256,
        }
    }
}

impl HeadsetConfig {
    pub fn validate(&self) -> BrainwaveResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(config_error!("simulated sample rate must be positive"));
        }
        if self.channel_count == 0 {
            return Err(config_error!("simulated headset needs at least one channel"));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(config_error!("noise standard deviation must be non-negative"));
        }
        if self.max_chunk_samples == 0 {
            return Err(config_error!("max chunk size must be greater than 0"));
        }
        Ok(())
    }
}

/// Deterministic-given-seed multi-channel EEG generator
pub struct EegSynthesizer {
    pattern: BrainwavePattern,
    sample_rate: f32,
    channel_count: usize,
    rng: rand::rngs::StdRng,
    noise: Option<Normal<f32>>,
    sample_index: u64,
}

impl EegSynthesizer {
    pub fn new(config: &HeadsetConfig) -> BrainwaveResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let noise = if config.noise_std > 0.0 {
            let normal = Normal::new(0.0, config.noise_std).map_err(|e| {
                config_error!("failed to create noise distribution: {}", e)
            })?;
            Some(normal)
        } else {
            None
        };

        Ok(EegSynthesizer {
            pattern: config.pattern.clone(),
            sample_rate: config.sample_rate,
            channel_count: config.channel_count,
            rng: rand::rngs::StdRng::seed_from_u64(seed),
            noise,
            sample_index: 0,
        })
    }

    /// Generate the next acquisition tick, one value per channel
    pub fn next_frame(&mut self) -> Vec<f32> {
        let t = self.sample_index as f32 / self.sample_rate;
        self.sample_index += 1;

        (0..self.channel_count)
            .map(|channel| {
                let phase = channel as f32 * 0.35;
                let clean = self.pattern.value_at(t, phase);
                match &self.noise {
                    Some(noise) => clean + noise.sample(&mut self.rng),
                    None => clean,
                }
            })
            .collect()
    }

    /// Generate `count` consecutive frames
    pub fn generate_chunk(&mut self, count: usize) -> Vec<Vec<f32>> {
        (0..count).map(|_| self.next_frame()).collect()
    }

    /// Frames generated so far
    pub fn samples_generated(&self) -> u64 {
        self.sample_index
    }

    pub fn set_pattern(&mut self, pattern: BrainwavePattern) {
        self.pattern = pattern;
    }
}

/// Discoverable simulated headset
pub struct SimulatedHeadset {
    config: HeadsetConfig,
}

impl SimulatedHeadset {
    pub fn new(config: HeadsetConfig) -> BrainwaveResult<Self> {
        config.validate()?;
        Ok(SimulatedHeadset { config })
    }

    pub fn config(&self) -> &HeadsetConfig {
        &self.config
    }
}

impl StreamResolver for SimulatedHeadset {
    fn resolve(&self, timeout: Duration) -> BrainwaveResult<Box<dyn SampleInlet>> {
        let latency = Duration::from_millis(self.config.discovery_latency_ms);
        let timeout_ms = timeout.as_millis() as u64;

        if !self.config.discoverable || latency > timeout {
            std::thread::sleep(timeout);
            debug!("Simulated headset not discovered within {}ms", timeout_ms);
            return Err(BrainwaveError::SourceNotFound { timeout_ms });
        }

        std::thread::sleep(latency);
        let inlet = SimulatedInlet::new(&self.config)?;
        info!(
            "Discovered {} ({} channels @ {:.0}Hz, pattern: {})",
            self.config.name,
            self.config.channel_count,
            self.config.sample_rate,
            self.config.pattern.name
        );
        Ok(Box::new(inlet))
    }
}

/// Connected simulated stream.
///
/// Emits as many samples per pull as the sampling rate says should have
/// arrived since the stream opened.
pub struct SimulatedInlet {
    info: StreamInfo,
    synthesizer: EegSynthesizer,
    opened_at: Instant,
    max_chunk_samples: usize,
    drop_after_samples: Option<u64>,
}

impl SimulatedInlet {
    pub fn new(config: &HeadsetConfig) -> BrainwaveResult<Self> {
        Ok(SimulatedInlet {
            info: StreamInfo {
                name: config.name.clone(),
                nominal_rate: config.sample_rate,
                channel_count: config.channel_count,
            },
            synthesizer: EegSynthesizer::new(config)?,
            opened_at: Instant::now(),
            max_chunk_samples: config.max_chunk_samples,
            drop_after_samples: config.drop_after_samples,
        })
    }

    fn samples_due(&self) -> u64 {
        let elapsed = self.opened_at.elapsed().as_secs_f64();
        let expected = (elapsed * self.info.nominal_rate as f64) as u64;
        expected.saturating_sub(self.synthesizer.samples_generated())
    }
}

impl SampleInlet for SimulatedInlet {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn pull_chunk(&mut self) -> BrainwaveResult<Vec<Vec<f32>>> {
        if let Some(limit) = self.drop_after_samples {
            if self.synthesizer.samples_generated() >= limit {
                return Err(BrainwaveError::SourceDisconnected {
                    reason: format!(
                        "{} stopped responding after {} samples",
                        self.info.name, limit
                    ),
                });
            }
        }

        let mut due = self.samples_due().min(self.max_chunk_samples as u64);
        if let Some(limit) = self.drop_after_samples {
            due = due.min(limit.saturating_sub(self.synthesizer.samples_generated()));
        }

        Ok(self.synthesizer.generate_chunk(due as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> HeadsetConfig {
        HeadsetConfig {
            noise_std: 0.0,
            seed: Some(7),
            discovery_latency_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_synthesizer_frames() {
        let mut synth = EegSynthesizer::new(&quiet_config()).unwrap();
        let chunk = synth.generate_chunk(32);
        assert_eq!(chunk.len(), 32);
        assert!(chunk.iter().all(|frame| frame.len() == 4));
        assert_eq!(synth.samples_generated(), 32);
        // Channels are phase shifted, not copies
        assert_ne!(chunk[5][0], chunk[5][1]);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let config = HeadsetConfig {
            seed: Some(42),
            ..quiet_config()
        };
        let config = HeadsetConfig { noise_std: 0.2, ..config };
        let a = EegSynthesizer::new(&config).unwrap().generate_chunk(16);
        let b = EegSynthesizer::new(&config).unwrap().generate_chunk(16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config() {
        let config = HeadsetConfig {
            channel_count: 0,
            ..Default::default()
        };
        assert!(SimulatedHeadset::new(config).is_err());

        let config = HeadsetConfig {
            noise_std: -1.0,
            ..Default::default()
        };
        assert!(EegSynthesizer::new(&config).is_err());
    }

    #[test]
    fn test_undiscoverable_headset_times_out() {
        let headset = SimulatedHeadset::new(HeadsetConfig {
            discoverable: false,
            ..quiet_config()
        })
        .unwrap();

        let result = headset.resolve(Duration::from_millis(20));
        assert!(matches!(
            result,
            Err(BrainwaveError::SourceNotFound { timeout_ms: 20 })
        ));
    }

    #[test]
    fn test_inlet_paces_samples_by_wall_clock() {
        let headset = SimulatedHeadset::new(quiet_config()).unwrap();
        let mut inlet = headset.resolve(Duration::from_millis(100)).unwrap();
        assert_eq!(inlet.info().channel_count, 4);

        std::thread::sleep(Duration::from_millis(100));
        let chunk = inlet.pull_chunk().unwrap();
        // ~25 samples due at 256Hz after 100ms
        assert!(chunk.len() >= 20, "got {} samples", chunk.len());
        assert!(chunk.len() <= 256);

        let immediate = inlet.pull_chunk().unwrap();
        assert!(immediate.len() < 5);
    }

    #[test]
    fn test_inlet_drops_after_limit() {
        let mut inlet = SimulatedInlet::new(&HeadsetConfig {
            drop_after_samples: Some(10),
            ..quiet_config()
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(100));
        let chunk = inlet.pull_chunk().unwrap();
        assert_eq!(chunk.len(), 10);

        let err = inlet.pull_chunk().unwrap_err();
        assert!(err.is_connection_loss());
    }
}
