//! Threshold rule mapping the dominant band to a mental state

use crate::config::AnalysisConfig;
use brainwave_core::{BandRanking, MentalState};

/// Default absolute power threshold for trusting the dominant band
pub const DEFAULT_ACTIVITY_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateClassifier {
    activity_threshold: f32,
}

impl StateClassifier {
    pub fn new(activity_threshold: f32) -> Self {
        StateClassifier { activity_threshold }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.activity_threshold)
    }

    pub fn activity_threshold(&self) -> f32 {
        self.activity_threshold
    }

    /// Unknown for an empty ranking, Low Activity when the top power does
    /// not exceed the threshold, otherwise the top band's fixed label.
    pub fn classify(&self, ranking: &BandRanking) -> MentalState {
        match ranking.dominant() {
            None => MentalState::Unknown,
            Some((band, power)) if power > self.activity_threshold => MentalState::for_band(band),
            Some(_) => MentalState::LowActivity,
        }
    }
}

impl Default for StateClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainwave_core::{Band, BandValues};

    fn ranking_with(band: Band, power: f32) -> BandRanking {
        let mut powers = BandValues::zeros();
        powers.set(band, power);
        BandRanking::from_powers(&powers)
    }

    #[test]
    fn test_empty_ranking_is_unknown() {
        let classifier = StateClassifier::default();
        assert_eq!(classifier.classify(&BandRanking::empty()), MentalState::Unknown);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let classifier = StateClassifier::default();
        assert_eq!(
            classifier.classify(&ranking_with(Band::Beta, 0.1)),
            MentalState::LowActivity
        );
        assert_eq!(
            classifier.classify(&ranking_with(Band::Beta, 0.1001)),
            MentalState::ActiveThinking
        );
        assert_eq!(
            classifier.classify(&BandRanking::from_powers(&BandValues::zeros())),
            MentalState::LowActivity
        );
    }

    #[test]
    fn test_fixed_label_per_band() {
        let classifier = StateClassifier::default();
        for band in Band::ALL {
            assert_eq!(
                classifier.classify(&ranking_with(band, 5.0)),
                MentalState::for_band(band)
            );
        }
    }

    #[test]
    fn test_configurable_threshold() {
        let classifier = StateClassifier::new(1000.0);
        assert_eq!(
            classifier.classify(&ranking_with(Band::Theta, 500.0)),
            MentalState::LowActivity
        );

        let mut config = AnalysisConfig::default();
        config.activity_threshold = 0.0;
        let classifier = StateClassifier::from_config(&config);
        assert_eq!(
            classifier.classify(&ranking_with(Band::Theta, 1e-6)),
            MentalState::Meditative
        );
    }
}
