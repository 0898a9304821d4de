//! Pre-defined brainwave activity patterns for simulation

use brainwave_core::{Band, BandValues};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Per-band oscillation amplitudes describing a simulated brain state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainwavePattern {
    pub name: String,
    /// Sine amplitude at each band's centre frequency
    pub amplitudes: BandValues,
}

impl BrainwavePattern {
    /// Pattern with a single strong band over a faint background
    pub fn dominated_by(name: &str, band: Band) -> Self {
        let amplitudes = BandValues::from_fn(|b| if b == band { 1.0 } else { 0.1 });
        BrainwavePattern {
            name: name.to_string(),
            amplitudes,
        }
    }

    pub fn deep_sleep() -> Self {
        Self::dominated_by("Deep Sleep", Band::Delta)
    }

    pub fn meditative() -> Self {
        Self::dominated_by("Meditative", Band::Theta)
    }

    pub fn relaxed() -> Self {
        Self::dominated_by("Relaxed", Band::Alpha)
    }

    pub fn focused() -> Self {
        Self::dominated_by("Focused", Band::Beta)
    }

    pub fn peak_processing() -> Self {
        Self::dominated_by("Peak Processing", Band::Gamma)
    }

    /// No oscillation at all
    pub fn flat_line() -> Self {
        BrainwavePattern {
            name: "Flat Line".to_string(),
            amplitudes: BandValues::zeros(),
        }
    }

    /// Signal value at time `t` (seconds).
    ///
    /// `phase` shifts every component, so channels of one headset are not
    /// identical copies of each other.
    pub fn value_at(&self, t: f32, phase: f32) -> f32 {
        self.amplitudes
            .iter()
            .filter(|(_, amplitude)| *amplitude != 0.0)
            .map(|(band, amplitude)| amplitude * (2.0 * PI * band.center_hz() * t + phase).sin())
            .sum()
    }

    /// Band with the largest amplitude, `None` for a flat line
    pub fn dominant_band(&self) -> Option<Band> {
        self.amplitudes
            .iter()
            .filter(|(_, amplitude)| *amplitude > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(band, _)| band)
    }

    /// Create common preset patterns
    pub fn presets() -> Vec<BrainwavePattern> {
        vec![
            Self::deep_sleep(),
            Self::meditative(),
            Self::relaxed(),
            Self::focused(),
            Self::peak_processing(),
            Self::flat_line(),
        ]
    }

    /// Look up a preset by name, ignoring case and separators
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        Self::presets()
            .into_iter()
            .find(|pattern| normalize(&pattern.name) == wanted)
    }
}

impl Default for BrainwavePattern {
    fn default() -> Self {
        Self::relaxed()
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_expected_dominant_band() {
        assert_eq!(BrainwavePattern::deep_sleep().dominant_band(), Some(Band::Delta));
        assert_eq!(BrainwavePattern::relaxed().dominant_band(), Some(Band::Alpha));
        assert_eq!(BrainwavePattern::peak_processing().dominant_band(), Some(Band::Gamma));
        assert_eq!(BrainwavePattern::flat_line().dominant_band(), None);
    }

    #[test]
    fn test_flat_line_is_zero() {
        let pattern = BrainwavePattern::flat_line();
        for i in 0..50 {
            assert_eq!(pattern.value_at(i as f32 * 0.01, 0.3), 0.0);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(BrainwavePattern::from_name("deep-sleep"), Some(BrainwavePattern::deep_sleep()));
        assert_eq!(BrainwavePattern::from_name("FOCUSED"), Some(BrainwavePattern::focused()));
        assert_eq!(BrainwavePattern::from_name("flat_line"), Some(BrainwavePattern::flat_line()));
        assert!(BrainwavePattern::from_name("hypnagogic").is_none());
    }
}
