//! Immutable analysis and publish snapshots

use crate::band::{BandRanking, BandValues};
use crate::channel::{ChannelId, ChannelLayout};
use crate::state::MentalState;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Copy of every channel buffer taken at one instant.
///
/// Serializes as a JSON object keyed by channel label, in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHistory {
    layout: ChannelLayout,
    samples: Vec<Vec<f32>>,
}

impl ChannelHistory {
    /// Pair a layout with per-channel samples.
    ///
    /// Missing channels are filled with empty histories and extra ones are
    /// dropped, so the result always matches the layout.
    pub fn new(layout: ChannelLayout, mut samples: Vec<Vec<f32>>) -> Self {
        samples.resize_with(layout.len(), Vec::new);
        ChannelHistory { layout, samples }
    }

    /// History with no samples on any channel
    pub fn empty(layout: ChannelLayout) -> Self {
        Self::new(layout, Vec::new())
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Per-channel samples in layout order
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.samples
    }

    pub fn channel(&self, channel: ChannelId) -> Option<&[f32]> {
        self.samples.get(channel.0).map(Vec::as_slice)
    }

    pub fn by_label(&self, label: &str) -> Option<&[f32]> {
        self.layout.find(label).and_then(|id| self.channel(id))
    }

    /// Iterate (label, samples) pairs in layout order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.layout
            .labels()
            .iter()
            .map(String::as_str)
            .zip(self.samples.iter().map(Vec::as_slice))
    }

    /// True when no channel holds any sample
    pub fn is_empty(&self) -> bool {
        self.samples.iter().all(Vec::is_empty)
    }

    pub fn total_samples(&self) -> usize {
        self.samples.iter().map(Vec::len).sum()
    }
}

impl Serialize for ChannelHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.samples.len()))?;
        for (label, samples) in self.iter() {
            map.serialize_entry(label, samples)?;
        }
        map.end()
    }
}

/// Result of one analysis cycle.
///
/// Power map, ranking and percentages always come from the same spectrum.
/// A snapshot is never mutated after construction; a new cycle replaces it
/// wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSnapshot {
    /// Sequence number of the producing cycle, 0 for the initial state
    pub cycle: u64,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub band_powers: BandValues,
    pub band_ranking: BandRanking,
    pub band_percentages: BandValues,
    pub dominant_state: MentalState,
    /// Buffer contents the cycle analyzed
    pub raw_data: ChannelHistory,
}

impl AnalysisSnapshot {
    /// All-zero, Unknown state used before the first successful cycle
    pub fn initial(layout: ChannelLayout) -> Self {
        AnalysisSnapshot {
            cycle: 0,
            analyzed_at: None,
            band_powers: BandValues::zeros(),
            band_ranking: BandRanking::empty(),
            band_percentages: BandValues::zeros(),
            dominant_state: MentalState::Unknown,
            raw_data: ChannelHistory::empty(layout),
        }
    }

    pub fn is_initial(&self) -> bool {
        self.cycle == 0
    }
}

/// Structure handed to the delivery collaborator on every publish tick
#[derive(Debug, Clone, Serialize)]
pub struct PublishedSnapshot {
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<Uuid>,
    pub cycle: u64,
    pub band_powers: BandValues,
    pub band_ranking: BandRanking,
    pub band_percentages: BandValues,
    pub dominant_state: MentalState,
    /// Buffer contents at publish time
    pub raw_data: ChannelHistory,
}

impl PublishedSnapshot {
    /// Combine the latest analysis with the current raw buffers
    pub fn compose(
        analysis: &AnalysisSnapshot,
        raw_data: ChannelHistory,
        session_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        PublishedSnapshot {
            timestamp,
            session_id,
            cycle: analysis.cycle,
            band_powers: analysis.band_powers,
            band_ranking: analysis.band_ranking.clone(),
            band_percentages: analysis.band_percentages,
            dominant_state: analysis.dominant_state,
            raw_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Band;

    #[test]
    fn test_history_matches_layout() {
        let layout = ChannelLayout::muse();
        let history = ChannelHistory::new(layout, vec![vec![1.0, 2.0], vec![3.0]]);

        assert_eq!(history.channels().len(), 4);
        assert_eq!(history.by_label("TP9"), Some(&[1.0, 2.0][..]));
        assert_eq!(history.by_label("AF7"), Some(&[3.0][..]));
        assert_eq!(history.by_label("TP10"), Some(&[][..]));
        assert_eq!(history.total_samples(), 3);
        assert!(!history.is_empty());
        assert!(ChannelHistory::empty(ChannelLayout::muse()).is_empty());
    }

    #[test]
    fn test_initial_snapshot() {
        let snapshot = AnalysisSnapshot::initial(ChannelLayout::muse());
        assert!(snapshot.is_initial());
        assert!(snapshot.band_powers.is_all_zero());
        assert!(snapshot.band_ranking.is_empty());
        assert_eq!(snapshot.dominant_state, MentalState::Unknown);
    }

    #[test]
    fn test_published_snapshot_wire_shape() {
        let layout = ChannelLayout::muse();
        let mut analysis = AnalysisSnapshot::initial(layout.clone());
        analysis.cycle = 3;
        analysis.band_powers.set(Band::Alpha, 2.0);
        analysis.band_ranking = BandRanking::from_powers(&analysis.band_powers);
        analysis.dominant_state = MentalState::RelaxedWakefulness;

        let raw = ChannelHistory::new(layout, vec![vec![0.5]; 4]);
        let published = PublishedSnapshot::compose(&analysis, raw, None, Utc::now());
        let json = serde_json::to_value(&published).unwrap();

        assert_eq!(json["cycle"], 3);
        assert_eq!(json["dominant_state"], "Relaxed Wakefulness");
        assert_eq!(json["band_powers"]["alpha"], 2.0);
        assert_eq!(json["band_ranking"][0][0], "alpha");
        assert_eq!(json["raw_data"]["TP9"][0], 0.5);
        assert!(json["timestamp"].is_string());
        assert!(json["session_id"].is_null());
    }
}
