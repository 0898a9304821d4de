//! Pipeline context owning the buffer store and the three loops
//!
//! Every control operation returns a [`ControlResponse`]; collaborator
//! failures are reported there and never escape as errors or panics.

use crate::analysis::{AnalysisController, AnalysisStats};
use crate::config::MonitorConfig;
use crate::control::{ControlResponse, PipelineStatus};
use crate::ingest::{IngestAdapter, IngestStats, SharedInlet};
use crate::publisher::{PublishStats, SnapshotPublisher};
use crate::sink::SnapshotSink;
use brainwave_core::{
    AnalysisSnapshot, BrainwaveError, BrainwaveResult, PublishedSnapshot, StreamInfo,
    StreamResolver,
};
use brainwave_processing::ChannelBufferStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Slack given to a resolver past its own discovery timeout
const DISCOVERY_GRACE: Duration = Duration::from_millis(250);

#[derive(Default)]
struct Connection {
    inlet: Option<SharedInlet>,
    stream: Option<StreamInfo>,
    session: Option<Uuid>,
}

struct PipelineShared {
    config: MonitorConfig,
    resolver: Arc<dyn StreamResolver>,
    store: Arc<ChannelBufferStore>,
    analysis: AnalysisController,
    ingest: IngestAdapter,
    publisher: SnapshotPublisher,
    /// Serializes control operations
    connection: AsyncMutex<Connection>,
    connected: AtomicBool,
    streaming: AtomicBool,
}

impl PipelineShared {
    /// Stop order: ingest, analysis, publisher. Every loop is stopped even
    /// when an earlier one reports a failure.
    async fn stop_loops(&self, connection: &mut Connection) -> BrainwaveResult<()> {
        let ingest = self.ingest.stop().await;
        let analysis = self.analysis.stop().await;
        let publisher = self.publisher.stop().await;

        connection.session = None;
        self.streaming.store(false, Ordering::SeqCst);

        ingest.and(analysis).and(publisher).map(|_| ())
    }

    /// Revert state after the acquisition loop gave up on its source
    async fn handle_source_failure(
        &self,
        session: Uuid,
        inlet: SharedInlet,
        error: BrainwaveError,
    ) {
        let mut connection = self.connection.lock().await;

        if connection.session == Some(session) {
            if let Err(e) = self.stop_loops(&mut connection).await {
                warn!("Error while stopping after source failure: {}", e);
            }
            warn!("Streaming stopped: {}", error);
        }

        let same_inlet = connection
            .inlet
            .as_ref()
            .map_or(false, |current| Arc::ptr_eq(current, &inlet));
        if error.is_connection_loss() && same_inlet {
            connection.inlet = None;
            connection.stream = None;
            self.connected.store(false, Ordering::SeqCst);
            warn!("Source connection lost");
        }
    }
}

/// Explicit context for one acquisition-analysis-publish pipeline
pub struct Pipeline {
    shared: Arc<PipelineShared>,
}

impl Pipeline {
    pub fn new(
        config: MonitorConfig,
        resolver: Arc<dyn StreamResolver>,
        sink: Arc<dyn SnapshotSink>,
    ) -> BrainwaveResult<Self> {
        config.validate()?;

        let store = Arc::new(ChannelBufferStore::from_config(&config.analysis)?);
        let analysis = AnalysisController::new(
            &config.analysis,
            Arc::clone(&store),
            config.analysis_period(),
        )?;
        let ingest = IngestAdapter::new(Arc::clone(&store), config.ingest_poll());
        let publisher = SnapshotPublisher::new(
            Arc::clone(&store),
            analysis.results(),
            sink,
            config.publish_period(),
        );

        Ok(Pipeline {
            shared: Arc::new(PipelineShared {
                config,
                resolver,
                store,
                analysis,
                ingest,
                publisher,
                connection: AsyncMutex::new(Connection::default()),
                connected: AtomicBool::new(false),
                streaming: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Discover a source, waiting at most the configured timeout plus a
    /// short grace period, even if the resolver overruns
    pub async fn connect(&self) -> ControlResponse {
        let shared = &self.shared;
        let mut connection = shared.connection.lock().await;

        if let Some(stream) = &connection.stream {
            return ControlResponse::ok(format!("Already connected to {}", stream.name));
        }

        let resolver = Arc::clone(&shared.resolver);
        let timeout = shared.config.discovery_timeout();
        info!("Looking for an EEG stream ({}ms timeout)...", timeout.as_millis());

        let discovery = tokio::task::spawn_blocking(move || resolver.resolve(timeout));
        let resolved = match tokio::time::timeout(timeout + DISCOVERY_GRACE, discovery).await {
            Ok(Ok(resolved)) => resolved,
            Ok(Err(e)) => Err(BrainwaveError::Worker {
                name: "discovery".to_string(),
                reason: e.to_string(),
            }),
            Err(_) => {
                // The blocking task is abandoned; a late inlet is dropped with it
                warn!("Resolver overran the {}ms discovery timeout", timeout.as_millis());
                Err(BrainwaveError::SourceNotFound {
                    timeout_ms: shared.config.discovery_timeout_ms,
                })
            }
        };

        let inlet = match resolved {
            Ok(inlet) => inlet,
            Err(e) => {
                warn!("Connection failed: {}", e);
                return ControlResponse::failure(format!("Failed to connect: {}", e));
            }
        };

        let info = inlet.info().clone();
        let required = shared.store.layout().len();
        if info.channel_count < required {
            return ControlResponse::failure(format!(
                "Failed to connect: {} has {} channels, {} required",
                info.name, info.channel_count, required
            ));
        }

        let expected_rate = shared.config.analysis.sample_rate;
        if (info.nominal_rate - expected_rate).abs() > 0.5 {
            warn!(
                "{} streams at {:.1}Hz but analysis assumes {:.1}Hz",
                info.name, info.nominal_rate, expected_rate
            );
        }

        info!(
            "Connected to {} ({} channels @ {:.0}Hz)",
            info.name, info.channel_count, info.nominal_rate
        );
        let message = format!("Connected to {}", info.name);
        connection.inlet = Some(Arc::new(Mutex::new(inlet)));
        connection.stream = Some(info);
        shared.connected.store(true, Ordering::SeqCst);

        ControlResponse::ok(message)
    }

    /// Stop streaming if needed and release the source
    pub async fn disconnect(&self) -> ControlResponse {
        let shared = &self.shared;
        let mut connection = shared.connection.lock().await;

        let mut stop_error = None;
        if shared.streaming.load(Ordering::SeqCst) {
            stop_error = shared.stop_loops(&mut connection).await.err();
        }

        let stream = connection.stream.take();
        connection.inlet = None;
        shared.connected.store(false, Ordering::SeqCst);

        match (stream, stop_error) {
            (_, Some(e)) => ControlResponse::failure(format!("Disconnected with errors: {}", e)),
            (Some(stream), None) => {
                info!("Disconnected from {}", stream.name);
                ControlResponse::ok(format!("Disconnected from {}", stream.name))
            }
            (None, None) => ControlResponse::ok("Not connected"),
        }
    }

    /// Start analysis, acquisition and publishing, in that order
    pub async fn start_streaming(&self) -> ControlResponse {
        let shared = &self.shared;
        let mut connection = shared.connection.lock().await;

        let Some(inlet) = connection.inlet.clone() else {
            return ControlResponse::failure("Not connected to an EEG stream");
        };
        if shared.streaming.load(Ordering::SeqCst) {
            return ControlResponse::ok("Already streaming");
        }

        let session = Uuid::new_v4();
        connection.session = Some(session);

        let weak = Arc::downgrade(&self.shared);
        let failed_inlet = Arc::clone(&inlet);
        let on_failure = move |error: BrainwaveError| {
            if let Some(shared) = weak.upgrade() {
                tokio::spawn(async move {
                    shared.handle_source_failure(session, failed_inlet, error).await;
                });
            }
        };

        shared.analysis.start().await;
        shared.ingest.start(inlet, on_failure).await;
        shared.publisher.start(Some(session)).await;
        shared.streaming.store(true, Ordering::SeqCst);

        info!("Streaming started (session {})", session);
        ControlResponse::ok(format!("Streaming started (session {})", session))
    }

    /// Stop acquisition, analysis and publishing, in that order, waiting
    /// for each loop to exit
    pub async fn stop_streaming(&self) -> ControlResponse {
        let shared = &self.shared;
        let mut connection = shared.connection.lock().await;

        if !shared.streaming.load(Ordering::SeqCst) {
            return ControlResponse::ok("Not streaming");
        }

        match shared.stop_loops(&mut connection).await {
            Ok(()) => {
                info!("Streaming stopped");
                ControlResponse::ok("Streaming stopped")
            }
            Err(e) => ControlResponse::failure(format!("Streaming stopped with errors: {}", e)),
        }
    }

    pub fn status(&self) -> PipelineStatus {
        let shared = &self.shared;
        PipelineStatus {
            connected: shared.connected.load(Ordering::SeqCst),
            streaming: shared.streaming.load(Ordering::SeqCst),
            has_active_source: shared.ingest.is_running(),
            publishing: shared.publisher.is_running(),
        }
    }

    /// What the publisher would send right now
    pub fn latest_snapshot(&self) -> PublishedSnapshot {
        self.shared.publisher.current()
    }

    pub fn latest_analysis(&self) -> Arc<AnalysisSnapshot> {
        self.shared.analysis.latest()
    }

    /// Drop all buffered samples
    pub fn reset_buffers(&self) -> ControlResponse {
        self.shared.store.clear();
        ControlResponse::ok("Buffers cleared")
    }

    /// Session tag of the current streaming run
    pub fn session(&self) -> Option<Uuid> {
        self.shared.publisher.session()
    }

    pub fn analysis_stats(&self) -> AnalysisStats {
        self.shared.analysis.stats()
    }

    pub fn ingest_stats(&self) -> IngestStats {
        self.shared.ingest.stats()
    }

    pub fn publish_stats(&self) -> PublishStats {
        self.shared.publisher.stats()
    }
}
