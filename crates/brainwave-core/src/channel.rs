//! Channel identity and electrode layout

use crate::config_error;
use crate::error::{BrainwaveError, BrainwaveResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Position of a channel within its layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub usize);

impl ChannelId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ChannelId {
    fn from(index: usize) -> Self {
        ChannelId(index)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Fixed, ordered set of electrode sites.
///
/// The order matches the positional order of values in each incoming sample
/// and never changes for the lifetime of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChannelLayout {
    labels: Vec<String>,
}

impl ChannelLayout {
    /// Create a layout from channel labels
    pub fn new<I, S>(labels: I) -> BrainwaveResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(config_error!("channel layout must contain at least one channel"));
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if label.trim().is_empty() {
                return Err(config_error!("channel labels cannot be empty"));
            }
            if !seen.insert(label.as_str()) {
                return Err(config_error!("duplicate channel label '{}'", label));
            }
        }

        Ok(ChannelLayout { labels })
    }

    /// Four-site consumer headband layout (temporal and frontal sites)
    pub fn muse() -> Self {
        ChannelLayout {
            labels: ["TP9", "AF7", "AF8", "TP10"]
                .iter()
                .map(|label| label.to_string())
                .collect(),
        }
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label for a channel, if it belongs to this layout
    pub fn label(&self, channel: ChannelId) -> Option<&str> {
        self.labels.get(channel.0).map(String::as_str)
    }

    /// Look up a channel by label
    pub fn find(&self, label: &str) -> Option<ChannelId> {
        self.labels.iter().position(|l| l == label).map(ChannelId)
    }

    pub fn contains(&self, channel: ChannelId) -> bool {
        channel.0 < self.labels.len()
    }

    /// Iterate channel ids in layout order
    pub fn ids(&self) -> impl Iterator<Item = ChannelId> {
        (0..self.labels.len()).map(ChannelId)
    }

    /// Reject a channel id outside the layout
    pub fn check(&self, channel: ChannelId) -> BrainwaveResult<()> {
        if self.contains(channel) {
            Ok(())
        } else {
            Err(BrainwaveError::UnknownChannel {
                channel: channel.0,
                channel_count: self.labels.len(),
            })
        }
    }
}

impl Default for ChannelLayout {
    fn default() -> Self {
        Self::muse()
    }
}

impl TryFrom<Vec<String>> for ChannelLayout {
    type Error = BrainwaveError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        ChannelLayout::new(labels)
    }
}

impl From<ChannelLayout> for Vec<String> {
    fn from(layout: ChannelLayout) -> Self {
        layout.labels
    }
}
