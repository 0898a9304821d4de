//! Analysis Cycle Controller
//!
//! Periodically snapshots the buffer store, runs the processing chain and
//! swaps the result into the shared snapshot slot.

use crate::worker::{PeriodicLoop, WorkerSlot};
use arc_swap::ArcSwap;
use brainwave_core::{AnalysisSnapshot, BrainwaveResult};
use brainwave_processing::{AnalysisConfig, BrainwaveProcessor, ChannelBufferStore, CycleMetrics};
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared slot holding the latest analysis result
pub type SnapshotSlot = Arc<ArcSwap<AnalysisSnapshot>>;

/// Counters describing the controller's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub running: bool,
    /// Cycles that produced a snapshot
    pub cycles: u64,
    /// Cycles that found nothing to analyze
    pub skipped_cycles: u64,
    /// Cycles that took longer than the period
    pub slow_cycles: u64,
    pub last_cycle_us: u64,
}

struct CycleState {
    store: Arc<ChannelBufferStore>,
    processor: Mutex<BrainwaveProcessor>,
    latest: SnapshotSlot,
    period: Duration,
    cycles: AtomicU64,
    skipped: AtomicU64,
    slow: AtomicU64,
    last_cycle_us: AtomicU64,
}

impl CycleState {
    fn run_cycle(&self) -> CycleMetrics {
        let history = self.store.snapshot();
        let output = self
            .processor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .process(history);
        let metrics = output.metrics;

        self.last_cycle_us
            .store(metrics.processing_time_us, Ordering::Relaxed);
        if metrics.processing_time_us > self.period.as_micros() as u64 {
            self.slow.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Analysis cycle took {}us, longer than the {}ms period",
                metrics.processing_time_us,
                self.period.as_millis()
            );
        }

        match output.snapshot {
            Some(snapshot) => {
                self.cycles.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Cycle {}: {} ({} samples, {}us)",
                    snapshot.cycle,
                    snapshot.dominant_state,
                    metrics.input_samples,
                    metrics.processing_time_us
                );
                self.latest.store(Arc::new(snapshot));
            }
            None => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                if let Some(reason) = &metrics.skipped {
                    debug!("Analysis cycle skipped: {}", reason);
                }
            }
        }

        metrics
    }
}

/// Runs the analysis chain on a fixed period.
///
/// Readers of [`AnalysisController::latest`] always get one whole snapshot;
/// a cycle replaces it with a single pointer swap.
pub struct AnalysisController {
    state: Arc<CycleState>,
    worker: WorkerSlot,
}

impl AnalysisController {
    pub fn new(
        config: &AnalysisConfig,
        store: Arc<ChannelBufferStore>,
        period: Duration,
    ) -> BrainwaveResult<Self> {
        let processor = BrainwaveProcessor::new(config)?;
        let initial = AnalysisSnapshot::initial(store.layout().clone());

        Ok(AnalysisController {
            state: Arc::new(CycleState {
                store,
                processor: Mutex::new(processor),
                latest: Arc::new(ArcSwap::from_pointee(initial)),
                period,
                cycles: AtomicU64::new(0),
                skipped: AtomicU64::new(0),
                slow: AtomicU64::new(0),
                last_cycle_us: AtomicU64::new(0),
            }),
            worker: WorkerSlot::new(),
        })
    }

    /// Start the periodic loop. No-op when already running.
    pub async fn start(&self) -> bool {
        let state = Arc::clone(&self.state);
        let started = self.worker.start_with(|| {
            PeriodicLoop::spawn("analysis", state.period, move || {
                state.run_cycle();
                ControlFlow::Continue(())
            })
        })
        .await;

        if started {
            info!("Analysis started ({}ms period)", self.state.period.as_millis());
        }
        started
    }

    /// Stop the loop and wait for an in-flight cycle to finish
    pub async fn stop(&self) -> BrainwaveResult<bool> {
        let stopped = self.worker.stop().await?;
        if stopped {
            info!("Analysis stopped after {} cycles", self.state.cycles.load(Ordering::Relaxed));
        }
        Ok(stopped)
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Run one cycle on the caller's thread
    pub fn analyze_once(&self) -> CycleMetrics {
        self.state.run_cycle()
    }

    /// Latest published result
    pub fn latest(&self) -> Arc<AnalysisSnapshot> {
        self.state.latest.load_full()
    }

    /// Handle to the snapshot slot for other readers
    pub fn results(&self) -> SnapshotSlot {
        Arc::clone(&self.state.latest)
    }

    pub fn stats(&self) -> AnalysisStats {
        AnalysisStats {
            running: self.is_running(),
            cycles: self.state.cycles.load(Ordering::Relaxed),
            skipped_cycles: self.state.skipped.load(Ordering::Relaxed),
            slow_cycles: self.state.slow.load(Ordering::Relaxed),
            last_cycle_us: self.state.last_cycle_us.load(Ordering::Relaxed),
        }
    }
}
