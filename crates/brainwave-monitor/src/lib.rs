//! Brainwave-Monitor: Real-time acquisition, analysis and publishing
//!
//! Wires the buffer store and processing chain into three independently
//! scheduled loops behind a small control surface.

pub mod config;
pub mod worker;
pub mod analysis;
pub mod ingest;
pub mod sink;
pub mod publisher;
pub mod control;
pub mod pipeline;

pub use config::MonitorConfig;
pub use worker::{PeriodicLoop, WorkerSlot};
pub use analysis::{AnalysisController, AnalysisStats, SnapshotSlot};
pub use ingest::{IngestAdapter, IngestStats, SharedInlet};
pub use sink::{BroadcastSink, JsonLinesSink, SnapshotSink};
pub use publisher::{PublishStats, SnapshotPublisher};
pub use control::{ControlResponse, PipelineStatus};
pub use pipeline::Pipeline;
