//! EEG frequency bands and per-band value maps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Index;

/// Recognized EEG frequency bands, in declaration order.
///
/// Declaration order doubles as the tie-break order when ranking bands
/// with equal power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    /// Number of recognized bands
    pub const COUNT: usize = 5;

    /// All bands in declaration order
    pub const ALL: [Band; Band::COUNT] = [
        Band::Delta,
        Band::Theta,
        Band::Alpha,
        Band::Beta,
        Band::Gamma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    /// Frequency range in Hz as (low, high)
    pub fn range(self) -> (f32, f32) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 100.0),
        }
    }

    pub fn low_hz(self) -> f32 {
        self.range().0
    }

    pub fn high_hz(self) -> f32 {
        self.range().1
    }

    /// Centre of the band, used when synthesizing band activity
    pub fn center_hz(self) -> f32 {
        let (low, high) = self.range();
        (low + high) / 2.0
    }

    /// Closed-interval membership used for band power integration.
    ///
    /// Both endpoints are included, so a bin sitting exactly on a shared
    /// boundary (4, 8, 13, 30 Hz) contributes to both neighbouring bands.
    pub fn contains(self, frequency: f32) -> bool {
        let (low, high) = self.range();
        frequency >= low && frequency <= high
    }

    /// Parse a band from its lowercase name
    pub fn from_name(name: &str) -> Option<Band> {
        Band::ALL.into_iter().find(|band| band.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per recognized band, always fully populated.
///
/// Serializes as a JSON object keyed by band name in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Band, f32>", into = "BTreeMap<Band, f32>")]
pub struct BandValues([f32; Band::COUNT]);

impl BandValues {
    pub fn zeros() -> Self {
        BandValues([0.0; Band::COUNT])
    }

    /// Build a map by evaluating `f` for every band
    pub fn from_fn(mut f: impl FnMut(Band) -> f32) -> Self {
        let mut values = [0.0; Band::COUNT];
        for band in Band::ALL {
            values[band.index()] = f(band);
        }
        BandValues(values)
    }

    pub fn get(&self, band: Band) -> f32 {
        self.0[band.index()]
    }

    pub fn set(&mut self, band: Band, value: f32) {
        self.0[band.index()] = value;
    }

    /// Iterate (band, value) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Band, f32)> + '_ {
        Band::ALL.into_iter().map(move |band| (band, self.get(band)))
    }

    /// Sum over all bands
    pub fn total(&self) -> f32 {
        self.0.iter().sum()
    }

    pub fn is_all_zero(&self) -> bool {
        self.0.iter().all(|&value| value == 0.0)
    }
}

impl Index<Band> for BandValues {
    type Output = f32;

    fn index(&self, band: Band) -> &f32 {
        &self.0[band.index()]
    }
}

impl From<BTreeMap<Band, f32>> for BandValues {
    fn from(map: BTreeMap<Band, f32>) -> Self {
        BandValues::from_fn(|band| map.get(&band).copied().unwrap_or(0.0))
    }
}

impl From<BandValues> for BTreeMap<Band, f32> {
    fn from(values: BandValues) -> Self {
        values.iter().collect()
    }
}

/// Bands ordered by descending power.
///
/// Serializes as an array of `[band, power]` pairs. Empty until the first
/// successful analysis cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandRanking(Vec<(Band, f32)>);

impl BandRanking {
    pub fn empty() -> Self {
        BandRanking(Vec::new())
    }

    /// Rank the bands of a power map.
    ///
    /// The sort is stable over declaration order, so equal powers keep the
    /// delta, theta, alpha, beta, gamma order.
    pub fn from_powers(powers: &BandValues) -> Self {
        let mut entries: Vec<(Band, f32)> = powers.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        BandRanking(entries)
    }

    /// Top-ranked band and its power
    pub fn dominant(&self) -> Option<(Band, f32)> {
        self.0.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> &[(Band, f32)] {
        &self.0
    }

    /// Bands in rank order
    pub fn bands(&self) -> Vec<Band> {
        self.0.iter().map(|(band, _)| *band).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_ranges() {
        assert_eq!(Band::Delta.range(), (0.5, 4.0));
        assert_eq!(Band::Gamma.range(), (30.0, 100.0));
        assert!(Band::Alpha.contains(8.0));
        assert!(Band::Alpha.contains(13.0));
        assert!(Band::Theta.contains(8.0));
        assert!(!Band::Delta.contains(0.0));
        assert_eq!(Band::from_name("beta"), Some(Band::Beta));
        assert_eq!(Band::from_name("mu"), None);
    }

    #[test]
    fn test_band_values_serialize_in_declaration_order() {
        let values = BandValues::from_fn(|band| band as usize as f32);
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(
            json,
            r#"{"delta":0.0,"theta":1.0,"alpha":2.0,"beta":3.0,"gamma":4.0}"#
        );

        let parsed: BandValues = serde_json::from_str(r#"{"alpha":2.5}"#).unwrap();
        assert_eq!(parsed[Band::Alpha], 2.5);
        assert_eq!(parsed[Band::Delta], 0.0);
    }

    #[test]
    fn test_ranking_descending() {
        let mut powers = BandValues::zeros();
        powers.set(Band::Beta, 3.0);
        powers.set(Band::Alpha, 5.0);
        powers.set(Band::Delta, 1.0);

        let ranking = BandRanking::from_powers(&powers);
        assert_eq!(
            ranking.bands(),
            vec![Band::Alpha, Band::Beta, Band::Delta, Band::Theta, Band::Gamma]
        );
        assert_eq!(ranking.dominant(), Some((Band::Alpha, 5.0)));
    }

    #[test]
    fn test_ranking_ties_follow_declaration_order() {
        let powers = BandValues::from_fn(|_| 2.0);
        let ranking = BandRanking::from_powers(&powers);
        assert_eq!(ranking.bands(), Band::ALL.to_vec());

        let mut powers = BandValues::zeros();
        powers.set(Band::Gamma, 1.0);
        powers.set(Band::Theta, 1.0);
        let ranking = BandRanking::from_powers(&powers);
        assert_eq!(
            ranking.bands(),
            vec![Band::Theta, Band::Gamma, Band::Delta, Band::Alpha, Band::Beta]
        );
    }

    #[test]
    fn test_ranking_serializes_as_pairs() {
        let mut powers = BandValues::zeros();
        powers.set(Band::Alpha, 1.5);
        let ranking = BandRanking::from_powers(&powers);
        let json = serde_json::to_value(&ranking).unwrap();
        assert_eq!(json[0][0], "alpha");
        assert_eq!(json[0][1], 1.5);
        assert_eq!(json.as_array().map(Vec::len), Some(5));
    }
}
