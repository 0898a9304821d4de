//! Configuration management for brainwave analysis

use crate::classifier::DEFAULT_ACTIVITY_THRESHOLD;
use brainwave_core::{config_error, Band, BrainwaveError, BrainwaveResult, ChannelLayout};
use serde::{Deserialize, Serialize};

/// Analysis parameters shared by the buffer store and the processing chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Configuration name/profile
    pub name: String,
    /// Nominal sampling rate of the incoming stream (Hz)
    pub sample_rate: f32,
    /// Samples kept per channel
    pub buffer_capacity: usize,
    /// Electrode sites in sample order
    pub channels: ChannelLayout,
    /// Absolute band power above which the dominant band is trusted.
    ///
    /// Tied to the amplitude units of the sensor and the unnormalized FFT
    /// scaling, so it has to be recalibrated for a different device.
    pub activity_threshold: f32,
}

impl AnalysisConfig {
    /// Four-channel consumer headband at 256 Hz with ~4 s of history
    pub fn muse_headband() -> Self {
        AnalysisConfig {
            name: "Muse headband".to_string(),
            sample_rate: 256.0,
            buffer_capacity: 1000,
            channels: ChannelLayout::muse(),
            activity_threshold: DEFAULT_ACTIVITY_THRESHOLD,
        }
    }

    /// Longer window for finer frequency resolution at the cost of latency
    pub fn high_resolution() -> Self {
        AnalysisConfig {
            name: "High resolution".to_string(),
            buffer_capacity: 2048,
            ..Self::muse_headband()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> BrainwaveResult<()> {
        if self.name.is_empty() {
            return Err(config_error!("configuration name cannot be empty"));
        }

        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(config_error!(
                "sample rate must be positive, got {}",
                self.sample_rate
            ));
        }

        // Anything below delta's lower edge cannot resolve a single band
        let nyquist = self.sample_rate / 2.0;
        if nyquist <= Band::Delta.low_hz() {
            return Err(config_error!(
                "sample rate {}Hz is too low to resolve any band",
                self.sample_rate
            ));
        }

        if self.buffer_capacity < 2 {
            return Err(config_error!(
                "buffer capacity must be at least 2 samples, got {}",
                self.buffer_capacity
            ));
        }

        if !self.activity_threshold.is_finite() || self.activity_threshold < 0.0 {
            return Err(config_error!(
                "activity threshold must be a non-negative number, got {}",
                self.activity_threshold
            ));
        }

        Ok(())
    }

    /// Bin spacing of a full-buffer spectrum (Hz)
    pub fn frequency_resolution(&self) -> f32 {
        self.sample_rate / self.buffer_capacity as f32
    }

    /// Seconds of signal a full buffer holds
    pub fn history_seconds(&self) -> f32 {
        self.buffer_capacity as f32 / self.sample_rate
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> BrainwaveResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BrainwaveError::Serialization {
            reason: format!("Failed to serialize analysis configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> BrainwaveResult<Self> {
        let config: AnalysisConfig =
            serde_json::from_str(json).map_err(|e| BrainwaveError::Serialization {
                reason: format!("Failed to deserialize analysis configuration: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::muse_headband()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muse_config() {
        let config = AnalysisConfig::muse_headband();
        assert_eq!(config.sample_rate, 256.0);
        assert_eq!(config.buffer_capacity, 1000);
        assert_eq!(config.channels.len(), 4);
        assert_eq!(config.activity_threshold, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_high_resolution_config() {
        let config = AnalysisConfig::high_resolution();
        let muse = AnalysisConfig::muse_headband();
        assert!(config.frequency_resolution() < muse.frequency_resolution());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnalysisConfig::default();

        config.sample_rate = 0.0;
        assert!(config.validate().is_err());
        config.sample_rate = f32::NAN;
        assert!(config.validate().is_err());
        config.sample_rate = 0.8;
        assert!(config.validate().is_err());

        config.sample_rate = 256.0;
        config.buffer_capacity = 1;
        assert!(config.validate().is_err());

        config.buffer_capacity = 512;
        config.activity_threshold = -0.5;
        assert!(config.validate().is_err());

        config.activity_threshold = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_serialization() {
        let config = AnalysisConfig::muse_headband();

        let json = config.to_json().unwrap();
        assert!(json.contains("TP9"));

        let deserialized = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(config, deserialized);

        let invalid = json.replace("1000", "0");
        assert!(AnalysisConfig::from_json(&invalid).is_err());
    }

    #[test]
    fn test_history_seconds() {
        let config = AnalysisConfig::muse_headband();
        assert!((config.history_seconds() - 1000.0 / 256.0).abs() < 1e-6);
    }
}
