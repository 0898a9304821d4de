//! Delivery sinks for published snapshots

use brainwave_core::{BrainwaveError, BrainwaveResult, PublishedSnapshot};
use crate::config::MonitorConfig;
use std::io::{self, Write};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::broadcast;
use tracing::trace;

/// Destination for periodic snapshot broadcasts
pub trait SnapshotSink: Send + Sync {
    fn deliver(&self, snapshot: &PublishedSnapshot) -> BrainwaveResult<()>;
}

/// Fan-out to any number of in-process subscribers.
///
/// Having no subscribers is not an error; the snapshot is dropped.
pub struct BroadcastSink {
    sender: broadcast::Sender<Arc<PublishedSnapshot>>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        BroadcastSink { sender }
    }

    /// Sized by `broadcast_capacity`
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.broadcast_capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PublishedSnapshot>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl SnapshotSink for BroadcastSink {
    fn deliver(&self, snapshot: &PublishedSnapshot) -> BrainwaveResult<()> {
        if self.sender.send(Arc::new(snapshot.clone())).is_err() {
            trace!("No subscribers for snapshot {}", snapshot.cycle);
        }
        Ok(())
    }
}

/// Lines the JSON writer may fall behind before snapshots are dropped
const WRITER_QUEUE: usize = 64;

/// Writes each snapshot as one line of JSON.
///
/// Writes run on a dedicated thread. When its queue is full the snapshot is
/// dropped and reported as a delivery failure.
pub struct JsonLinesSink<W> {
    lines: SyncSender<String>,
    writer: JoinHandle<io::Result<W>>,
}

impl<W: Write + Send + 'static> JsonLinesSink<W> {
    pub fn new(writer: W) -> BrainwaveResult<Self> {
        Self::with_queue(writer, WRITER_QUEUE)
    }

    pub fn with_queue(mut writer: W, queue: usize) -> BrainwaveResult<Self> {
        let (lines, pending) = sync_channel::<String>(queue.max(1));

        let writer = thread::Builder::new()
            .name("jsonl-writer".to_string())
            .spawn(move || -> io::Result<W> {
                for line in pending {
                    writeln!(writer, "{}", line)?;
                    writer.flush()?;
                }
                Ok(writer)
            })
            .map_err(|e| BrainwaveError::Delivery {
                reason: format!("cannot spawn writer thread: {}", e),
            })?;

        Ok(JsonLinesSink { lines, writer })
    }

    /// Write out every queued line and hand back the writer
    pub fn into_inner(self) -> BrainwaveResult<W> {
        let JsonLinesSink { lines, writer } = self;
        drop(lines);

        match writer.join() {
            Ok(result) => result.map_err(|e| BrainwaveError::Delivery {
                reason: e.to_string(),
            }),
            Err(_) => Err(BrainwaveError::Delivery {
                reason: "writer thread panicked".to_string(),
            }),
        }
    }
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> BrainwaveResult<Self> {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> SnapshotSink for JsonLinesSink<W> {
    fn deliver(&self, snapshot: &PublishedSnapshot) -> BrainwaveResult<()> {
        let line = serde_json::to_string(snapshot).map_err(|e| BrainwaveError::Serialization {
            reason: e.to_string(),
        })?;

        self.lines.try_send(line).map_err(|e| match e {
            TrySendError::Full(_) => BrainwaveError::Delivery {
                reason: format!("writer is behind, snapshot {} dropped", snapshot.cycle),
            },
            TrySendError::Disconnected(_) => BrainwaveError::Delivery {
                reason: "writer stopped".to_string(),
            },
        })
    }
}
