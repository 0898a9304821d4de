//! Ingest Adapter and acquisition loop

use crate::worker::{PeriodicLoop, WorkerSlot};
use brainwave_core::{BrainwaveError, BrainwaveResult, SampleInlet};
use brainwave_processing::ChannelBufferStore;
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info, trace};

/// Connected inlet shared between the pipeline and the acquisition loop
pub type SharedInlet = Arc<Mutex<Box<dyn SampleInlet>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub running: bool,
    /// Samples written to the buffer store
    pub samples: u64,
    /// Samples rejected as malformed
    pub rejected: u64,
    /// Non-empty chunks pulled from the inlet
    pub chunks: u64,
}

struct IngestState {
    store: Arc<ChannelBufferStore>,
    samples: AtomicU64,
    rejected: AtomicU64,
    chunks: AtomicU64,
}

impl IngestState {
    fn on_sample(&self, values: &[f32]) -> BrainwaveResult<usize> {
        let expected = self.store.layout().len();
        if values.len() < expected {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(BrainwaveError::Acquisition {
                reason: format!(
                    "malformed sample: {} values for {} channels",
                    values.len(),
                    expected
                ),
            });
        }

        let written = self.store.write_frame(values);
        self.samples.fetch_add(1, Ordering::Relaxed);
        Ok(written)
    }

    fn ingest_chunk(&self, chunk: &[Vec<f32>]) -> BrainwaveResult<usize> {
        if chunk.is_empty() {
            return Ok(0);
        }

        self.chunks.fetch_add(1, Ordering::Relaxed);
        for frame in chunk {
            self.on_sample(frame)?;
        }
        trace!("Ingested {} samples", chunk.len());
        Ok(chunk.len())
    }
}

/// Maps per-tick acquisition samples onto the buffer store.
///
/// Samples are positional: value `i` goes to channel `i` of the layout and
/// extra values are ignored. A sample with fewer values than channels is
/// rejected whole.
pub struct IngestAdapter {
    state: Arc<IngestState>,
    poll_period: Duration,
    worker: WorkerSlot,
}

impl IngestAdapter {
    pub fn new(store: Arc<ChannelBufferStore>, poll_period: Duration) -> Self {
        IngestAdapter {
            state: Arc::new(IngestState {
                store,
                samples: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                chunks: AtomicU64::new(0),
            }),
            poll_period,
            worker: WorkerSlot::new(),
        }
    }

    /// Push one acquisition tick. Returns the number of channels written.
    pub fn on_sample(&self, values: &[f32]) -> BrainwaveResult<usize> {
        self.state.on_sample(values)
    }

    /// Push a chunk of ticks, oldest first. Stops at the first malformed one.
    pub fn ingest_chunk(&self, chunk: &[Vec<f32>]) -> BrainwaveResult<usize> {
        self.state.ingest_chunk(chunk)
    }

    /// Start polling `inlet`. No-op when already running.
    ///
    /// On the first acquisition error the loop logs it, hands it to
    /// `on_failure` and exits.
    pub async fn start<F>(&self, inlet: SharedInlet, on_failure: F) -> bool
    where
        F: FnOnce(BrainwaveError) + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let period = self.poll_period;
        let started = self.worker.start_with(move || {
            let mut on_failure = Some(on_failure);
            PeriodicLoop::spawn("ingest", period, move || {
                let pulled = inlet
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pull_chunk();

                match pulled.and_then(|chunk| state.ingest_chunk(&chunk)) {
                    Ok(_) => ControlFlow::Continue(()),
                    Err(e) => {
                        error!("Acquisition stopped: {}", e);
                        if let Some(notify) = on_failure.take() {
                            notify(e);
                        }
                        ControlFlow::Break(())
                    }
                }
            })
        })
        .await;

        if started {
            info!("Acquisition started ({}ms poll)", period.as_millis());
        }
        started
    }

    pub async fn stop(&self) -> BrainwaveResult<bool> {
        let stopped = self.worker.stop().await?;
        if stopped {
            info!(
                "Acquisition stopped after {} samples",
                self.state.samples.load(Ordering::Relaxed)
            );
        }
        Ok(stopped)
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            running: self.is_running(),
            samples: self.state.samples.load(Ordering::Relaxed),
            rejected: self.state.rejected.load(Ordering::Relaxed),
            chunks: self.state.chunks.load(Ordering::Relaxed),
        }
    }
}
