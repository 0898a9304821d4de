//! Bounded per-channel sample history

use crate::config::AnalysisConfig;
use brainwave_core::{config_error, BrainwaveResult, ChannelHistory, ChannelId, ChannelLayout};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Fixed-capacity history for every channel of a layout.
///
/// All channel buffers sit behind a single lock so a snapshot always sees
/// one generation across channels. Writes are O(1) and hold the lock only
/// for the push itself.
pub struct ChannelBufferStore {
    layout: ChannelLayout,
    capacity: usize,
    buffers: Mutex<Vec<VecDeque<f32>>>,
}

impl ChannelBufferStore {
    /// Create a store holding `capacity` samples per channel
    pub fn new(layout: ChannelLayout, capacity: usize) -> BrainwaveResult<Self> {
        if capacity == 0 {
            return Err(config_error!("buffer capacity must be greater than 0"));
        }

        let buffers = (0..layout.len())
            .map(|_| VecDeque::with_capacity(capacity))
            .collect();

        Ok(ChannelBufferStore {
            layout,
            capacity,
            buffers: Mutex::new(buffers),
        })
    }

    /// Create a store sized from analysis configuration
    pub fn from_config(config: &AnalysisConfig) -> BrainwaveResult<Self> {
        Self::new(config.channels.clone(), config.buffer_capacity)
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one value to a channel, evicting the oldest when full.
    ///
    /// A channel outside the layout is rejected and nothing is stored.
    pub fn write(&self, channel: ChannelId, value: f32) -> BrainwaveResult<()> {
        self.layout.check(channel)?;
        let mut buffers = self.lock();
        push_bounded(&mut buffers[channel.index()], self.capacity, value);
        Ok(())
    }

    /// Append one positional frame, one value per channel, under a single
    /// lock acquisition.
    ///
    /// Values beyond the channel count are ignored. Returns the number of
    /// values stored.
    pub fn write_frame(&self, values: &[f32]) -> usize {
        let mut buffers = self.lock();
        let mut written = 0;
        for (buffer, &value) in buffers.iter_mut().zip(values) {
            push_bounded(buffer, self.capacity, value);
            written += 1;
        }
        written
    }

    /// Coherent copy of all channel buffers
    pub fn snapshot(&self) -> ChannelHistory {
        let samples = {
            let buffers = self.lock();
            buffers
                .iter()
                .map(|buffer| buffer.iter().copied().collect())
                .collect()
        };
        ChannelHistory::new(self.layout.clone(), samples)
    }

    /// Samples currently held by a channel, 0 for unknown channels
    pub fn len(&self, channel: ChannelId) -> usize {
        self.lock()
            .get(channel.index())
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// True when every channel is empty
    pub fn is_empty(&self) -> bool {
        self.lock().iter().all(VecDeque::is_empty)
    }

    /// Drop all buffered samples
    pub fn clear(&self) {
        for buffer in self.lock().iter_mut() {
            buffer.clear();
        }
    }

    // A panicking writer cannot leave a buffer half-updated (push and pop are
    // each complete), so a poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Vec<VecDeque<f32>>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_bounded(buffer: &mut VecDeque<f32>, capacity: usize, value: f32) {
    if buffer.len() == capacity {
        buffer.pop_front();
    }
    buffer.push_back(value);
}
