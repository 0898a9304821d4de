//! Snapshot Publisher
//!
//! Independent periodic loop that pairs the latest analysis result with
//! the current raw buffers and hands the result to a delivery sink.

use crate::analysis::SnapshotSlot;
use crate::sink::SnapshotSink;
use crate::worker::{PeriodicLoop, WorkerSlot};
use brainwave_core::{BrainwaveResult, PublishedSnapshot};
use brainwave_processing::ChannelBufferStore;
use chrono::Utc;
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishStats {
    pub running: bool,
    pub published: u64,
    /// Deliveries the sink refused
    pub failed: u64,
}

struct PublishState {
    store: Arc<ChannelBufferStore>,
    results: SnapshotSlot,
    sink: Arc<dyn SnapshotSink>,
    session: Mutex<Option<Uuid>>,
    published: AtomicU64,
    failed: AtomicU64,
}

impl PublishState {
    fn session(&self) -> Option<Uuid> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn compose(&self) -> PublishedSnapshot {
        let analysis = self.results.load();
        PublishedSnapshot::compose(&analysis, self.store.snapshot(), self.session(), Utc::now())
    }

    fn publish(&self) -> BrainwaveResult<PublishedSnapshot> {
        let snapshot = self.compose();
        match self.sink.deliver(&snapshot) {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                Ok(snapshot)
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}

pub struct SnapshotPublisher {
    state: Arc<PublishState>,
    period: Duration,
    worker: WorkerSlot,
}

impl SnapshotPublisher {
    pub fn new(
        store: Arc<ChannelBufferStore>,
        results: SnapshotSlot,
        sink: Arc<dyn SnapshotSink>,
        period: Duration,
    ) -> Self {
        SnapshotPublisher {
            state: Arc::new(PublishState {
                store,
                results,
                sink,
                session: Mutex::new(None),
                published: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
            period,
            worker: WorkerSlot::new(),
        }
    }

    /// Start publishing, tagging snapshots with `session`. No-op when
    /// already running.
    ///
    /// Delivery failures are logged and the loop keeps going.
    pub async fn start(&self, session: Option<Uuid>) -> bool {
        let state = Arc::clone(&self.state);
        let started = self.worker.start_with(|| {
            *state.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
            PeriodicLoop::spawn("publisher", self.period, move || {
                if let Err(e) = state.publish() {
                    warn!("Snapshot delivery failed: {}", e);
                }
                ControlFlow::Continue(())
            })
        })
        .await;

        if started {
            info!("Publishing started ({}ms period)", self.period.as_millis());
        }
        started
    }

    pub async fn stop(&self) -> BrainwaveResult<bool> {
        let stopped = self.worker.stop().await?;
        if stopped {
            *self.state.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
            info!(
                "Publishing stopped after {} snapshots",
                self.state.published.load(Ordering::Relaxed)
            );
        }
        Ok(stopped)
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Compose and deliver one snapshot outside the loop
    pub fn publish_once(&self) -> BrainwaveResult<PublishedSnapshot> {
        self.state.publish()
    }

    /// The snapshot the next tick would publish, without delivering it
    pub fn current(&self) -> PublishedSnapshot {
        self.state.compose()
    }

    pub fn session(&self) -> Option<Uuid> {
        self.state.session()
    }

    pub fn stats(&self) -> PublishStats {
        PublishStats {
            running: self.is_running(),
            published: self.state.published.load(Ordering::Relaxed),
            failed: self.state.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BroadcastSink;
    use arc_swap::ArcSwap;
    use brainwave_core::{AnalysisSnapshot, BrainwaveError, ChannelLayout, MentalState};
    use tokio::time::sleep;

    struct RefusingSink;

    impl SnapshotSink for RefusingSink {
        fn deliver(&self, _snapshot: &PublishedSnapshot) -> BrainwaveResult<()> {
            Err(BrainwaveError::Delivery {
                reason: "client went away".to_string(),
            })
        }
    }

    fn fixture(
        sink: Arc<dyn SnapshotSink>,
    ) -> (SnapshotPublisher, Arc<ChannelBufferStore>, SnapshotSlot) {
        let store = Arc::new(ChannelBufferStore::new(ChannelLayout::muse(), 8).unwrap());
        let results: SnapshotSlot = Arc::new(ArcSwap::from_pointee(AnalysisSnapshot::initial(
            ChannelLayout::muse(),
        )));
        let publisher = SnapshotPublisher::new(
            Arc::clone(&store),
            Arc::clone(&results),
            sink,
            Duration::from_millis(10),
        );
        (publisher, store, results)
    }

    #[test]
    fn test_initial_state_published_before_analysis() {
        let sink = Arc::new(BroadcastSink::new(8));
        let mut rx = sink.subscribe();
        let (publisher, _, _) = fixture(sink);

        publisher.publish_once().unwrap();
        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.cycle, 0);
        assert_eq!(snapshot.dominant_state, MentalState::Unknown);
        assert!(snapshot.band_powers.is_all_zero());
        assert!(snapshot.band_ranking.is_empty());
        assert!(snapshot.session_id.is_none());
    }

    #[test]
    fn test_raw_data_is_current_buffer() {
        let (publisher, store, results) = fixture(Arc::new(BroadcastSink::new(8)));
        store.write_frame(&[1.0, 2.0, 3.0, 4.0]);

        let mut analysis = AnalysisSnapshot::initial(ChannelLayout::muse());
        analysis.cycle = 7;
        analysis.dominant_state = MentalState::ActiveThinking;
        results.store(Arc::new(analysis));

        let snapshot = publisher.current();
        assert_eq!(snapshot.cycle, 7);
        assert_eq!(snapshot.dominant_state, MentalState::ActiveThinking);
        assert_eq!(snapshot.raw_data.by_label("AF8"), Some(&[3.0][..]));
        assert_eq!(publisher.stats().published, 0);
    }

    #[tokio::test]
    async fn test_loop_tags_session() {
        let sink = Arc::new(BroadcastSink::new(64));
        let mut rx = sink.subscribe();
        let (publisher, _, _) = fixture(sink);
        let session = Uuid::new_v4();

        assert!(publisher.start(Some(session)).await);
        assert!(!publisher.start(None).await);
        sleep(Duration::from_millis(50)).await;
        assert!(publisher.stop().await.unwrap());

        let mut received = 0;
        while let Ok(snapshot) = rx.try_recv() {
            assert_eq!(snapshot.session_id, Some(session));
            received += 1;
        }
        assert!(received >= 3, "only {} snapshots", received);
        assert_eq!(publisher.session(), None);
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_loop_alive() {
        let (publisher, _, _) = fixture(Arc::new(RefusingSink));

        publisher.start(None).await;
        sleep(Duration::from_millis(50)).await;
        assert!(publisher.is_running());

        let stats = publisher.stats();
        assert!(stats.failed >= 3);
        assert_eq!(stats.published, 0);

        publisher.stop().await.unwrap();
        assert!(!publisher.is_running());
    }
}
