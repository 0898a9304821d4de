//! Acquisition collaborator interface
//!
//! Discovery is bounded by a timeout and yields an inlet; the inlet hands
//! out whatever samples have arrived since the previous pull.

use crate::error::BrainwaveResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Description of a discovered sample stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub name: String,
    /// Nominal sampling rate in Hz
    pub nominal_rate: f32,
    pub channel_count: usize,
}

/// Connected sample stream
pub trait SampleInlet: Send {
    /// Stream description captured at connect time
    fn info(&self) -> &StreamInfo;

    /// Return all samples available right now, oldest first.
    ///
    /// Each inner vector is one acquisition tick with one value per channel.
    /// Must not block waiting for data; an empty chunk means nothing new
    /// has arrived.
    fn pull_chunk(&mut self) -> BrainwaveResult<Vec<Vec<f32>>>;
}

/// Stream discovery
pub trait StreamResolver: Send + Sync {
    /// Search for a stream for at most `timeout`.
    ///
    /// Returns `SourceNotFound` when nothing turns up in time.
    fn resolve(&self, timeout: Duration) -> BrainwaveResult<Box<dyn SampleInlet>>;
}
