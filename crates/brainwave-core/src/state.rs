//! Coarse mental-state labels derived from the dominant band

use crate::band::Band;
use serde::{Deserialize, Serialize};

/// Mental state classification.
///
/// Serializes as its human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MentalState {
    #[serde(rename = "Deep Relaxation/Sleep")]
    DeepRelaxation,
    #[serde(rename = "Creative/Meditative")]
    Meditative,
    #[serde(rename = "Relaxed Wakefulness")]
    RelaxedWakefulness,
    #[serde(rename = "Active Thinking")]
    ActiveThinking,
    #[serde(rename = "High-Level Processing")]
    HighLevelProcessing,
    #[serde(rename = "Low Activity")]
    LowActivity,
    #[default]
    Unknown,
}

impl MentalState {
    /// Fixed interpretation of a dominant band
    pub fn for_band(band: Band) -> Self {
        match band {
            Band::Delta => MentalState::DeepRelaxation,
            Band::Theta => MentalState::Meditative,
            Band::Alpha => MentalState::RelaxedWakefulness,
            Band::Beta => MentalState::ActiveThinking,
            Band::Gamma => MentalState::HighLevelProcessing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MentalState::DeepRelaxation => "Deep Relaxation/Sleep",
            MentalState::Meditative => "Creative/Meditative",
            MentalState::RelaxedWakefulness => "Relaxed Wakefulness",
            MentalState::ActiveThinking => "Active Thinking",
            MentalState::HighLevelProcessing => "High-Level Processing",
            MentalState::LowActivity => "Low Activity",
            MentalState::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for MentalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_interpretation() {
        assert_eq!(MentalState::for_band(Band::Delta), MentalState::DeepRelaxation);
        assert_eq!(MentalState::for_band(Band::Alpha), MentalState::RelaxedWakefulness);
        assert_eq!(MentalState::for_band(Band::Gamma), MentalState::HighLevelProcessing);
    }

    #[test]
    fn test_serializes_as_label() {
        for state in [
            MentalState::DeepRelaxation,
            MentalState::Meditative,
            MentalState::RelaxedWakefulness,
            MentalState::ActiveThinking,
            MentalState::HighLevelProcessing,
            MentalState::LowActivity,
            MentalState::Unknown,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.label()));
        }
        assert_eq!(MentalState::default(), MentalState::Unknown);
    }
}
