//! Scripted sources replaying prepared frames

use brainwave_core::{BrainwaveError, BrainwaveResult, SampleInlet, StreamInfo, StreamResolver};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type FrameQueue = Arc<Mutex<VecDeque<Vec<f32>>>>;

fn lock(queue: &FrameQueue) -> MutexGuard<'_, VecDeque<Vec<f32>>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolver handing out inlets that drain a shared frame queue.
///
/// Frames pushed after connecting are visible to the live inlet.
pub struct ScriptedResolver {
    info: StreamInfo,
    frames: FrameQueue,
    frames_per_pull: usize,
    absent: bool,
    disconnect_when_exhausted: bool,
    resolves: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(info: StreamInfo) -> Self {
        ScriptedResolver {
            info,
            frames: Arc::new(Mutex::new(VecDeque::new())),
            frames_per_pull: usize::MAX,
            absent: false,
            disconnect_when_exhausted: false,
            resolves: AtomicUsize::new(0),
        }
    }

    /// Four-channel 256 Hz stream
    pub fn muse() -> Self {
        Self::new(StreamInfo {
            name: "Scripted Muse".to_string(),
            nominal_rate: 256.0,
            channel_count: 4,
        })
    }

    /// Resolver whose discovery never succeeds
    pub fn absent(mut self) -> Self {
        self.absent = true;
        self
    }

    pub fn with_frames(self, frames: impl IntoIterator<Item = Vec<f32>>) -> Self {
        self.push_frames(frames);
        self
    }

    /// Limit frames returned per pull
    pub fn frames_per_pull(mut self, count: usize) -> Self {
        self.frames_per_pull = count.max(1);
        self
    }

    /// Report a disconnect once the queue runs dry
    pub fn disconnect_when_exhausted(mut self) -> Self {
        self.disconnect_when_exhausted = true;
        self
    }

    pub fn push_frames(&self, frames: impl IntoIterator<Item = Vec<f32>>) {
        lock(&self.frames).extend(frames);
    }

    /// Frames not yet pulled
    pub fn pending(&self) -> usize {
        lock(&self.frames).len()
    }

    /// Number of successful discoveries
    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::Relaxed)
    }
}

impl StreamResolver for ScriptedResolver {
    fn resolve(&self, timeout: Duration) -> BrainwaveResult<Box<dyn SampleInlet>> {
        if self.absent {
            return Err(BrainwaveError::SourceNotFound {
                timeout_ms: timeout.as_millis() as u64,
            });
        }

        self.resolves.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(ScriptedInlet {
            info: self.info.clone(),
            frames: Arc::clone(&self.frames),
            frames_per_pull: self.frames_per_pull,
            disconnect_when_exhausted: self.disconnect_when_exhausted,
        }))
    }
}

pub struct ScriptedInlet {
    info: StreamInfo,
    frames: FrameQueue,
    frames_per_pull: usize,
    disconnect_when_exhausted: bool,
}

impl SampleInlet for ScriptedInlet {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn pull_chunk(&mut self) -> BrainwaveResult<Vec<Vec<f32>>> {
        let mut queue = lock(&self.frames);
        if queue.is_empty() && self.disconnect_when_exhausted {
            return Err(BrainwaveError::SourceDisconnected {
                reason: format!("{} script exhausted", self.info.name),
            });
        }

        let count = queue.len().min(self.frames_per_pull);
        Ok(queue.drain(..count).collect())
    }
}

/// `count` frames of a pure sine at `frequency`, identical on every channel
pub fn sine_frames(
    frequency: f32,
    sample_rate: f32,
    channel_count: usize,
    count: usize,
) -> Vec<Vec<f32>> {
    (0..count)
        .map(|i| {
            let value = (2.0 * PI * frequency * i as f32 / sample_rate).sin();
            vec![value; channel_count]
        })
        .collect()
}
