//! Runtime configuration for the monitor

use brainwave_core::{config_error, BrainwaveError, BrainwaveResult};
use brainwave_processing::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Analysis parameters plus loop scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub analysis: AnalysisConfig,
    /// Analysis cycle period in milliseconds
    pub analysis_period_ms: u64,
    /// Snapshot publish period in milliseconds
    pub publish_period_ms: u64,
    /// How often the acquisition loop polls the inlet
    pub ingest_poll_ms: u64,
    /// Upper bound on stream discovery
    pub discovery_timeout_ms: u64,
    /// Snapshots a lagging broadcast subscriber may fall behind
    pub broadcast_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            analysis_period_ms: 100,
            publish_period_ms: 100,
            ingest_poll_ms: 10,
            discovery_timeout_ms: 10_000,
            broadcast_capacity: 64,
        }
    }
}

impl MonitorConfig {
    pub fn analysis_period(&self) -> Duration {
        Duration::from_millis(self.analysis_period_ms)
    }

    pub fn publish_period(&self) -> Duration {
        Duration::from_millis(self.publish_period_ms)
    }

    pub fn ingest_poll(&self) -> Duration {
        Duration::from_millis(self.ingest_poll_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn validate(&self) -> BrainwaveResult<()> {
        self.analysis.validate()?;

        for (name, value) in [
            ("analysis_period_ms", self.analysis_period_ms),
            ("publish_period_ms", self.publish_period_ms),
            ("ingest_poll_ms", self.ingest_poll_ms),
        ] {
            if value == 0 {
                return Err(config_error!("{} must be greater than 0", name));
            }
        }

        if self.broadcast_capacity == 0 {
            return Err(config_error!("broadcast_capacity must be greater than 0"));
        }

        Ok(())
    }

    pub fn to_json(&self) -> BrainwaveResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BrainwaveError::Serialization {
            reason: e.to_string(),
        })
    }

    /// Parse and validate; missing fields take their defaults
    pub fn from_json(json: &str) -> BrainwaveResult<Self> {
        let config: MonitorConfig =
            serde_json::from_str(json).map_err(|e| BrainwaveError::Serialization {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> BrainwaveResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| config_error!("cannot read {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }
}
