//! Fixed-period background loop with cooperative shutdown

use brainwave_core::{BrainwaveError, BrainwaveResult};
use std::ops::ControlFlow;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Handle to a spawned periodic loop.
///
/// The shutdown flag is checked before every tick, so a tick that is
/// already running always finishes. Dropping the handle also ends the loop.
pub struct PeriodicLoop {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicLoop {
    /// Spawn `tick` every `period` on the current runtime.
    ///
    /// The first tick fires immediately. Returning `ControlFlow::Break`
    /// ends the loop from the inside.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!("{} loop started ({}ms period)", name, period.as_millis());

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                tokio::select! {
                    biased;

                    changed = shutdown_rx.changed() => {
                        // Sender gone: the owner was dropped
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = timer.tick() => {
                        if tick().is_break() {
                            break;
                        }
                    }
                }
            }

            debug!("{} loop exited", name);
        });

        PeriodicLoop {
            name,
            shutdown,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True once the loop has exited for any reason
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal shutdown and wait for the loop task to exit
    pub async fn stop(self) -> BrainwaveResult<()> {
        let PeriodicLoop {
            name,
            shutdown,
            handle,
        } = self;

        // Fails only when the loop already exited
        let _ = shutdown.send(true);
        handle.await.map_err(|e| BrainwaveError::Worker {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Holds at most one live loop for a component
#[derive(Default)]
pub struct WorkerSlot {
    current: Mutex<Option<PeriodicLoop>>,
}

impl WorkerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PeriodicLoop>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.lock().as_ref().map_or(false, |worker| !worker.is_finished())
    }

    /// Join a loop that exited on its own. Returns false if there was none.
    pub async fn reap(&self) -> BrainwaveResult<bool> {
        let finished = {
            let mut current = self.lock();
            if current.as_ref().map_or(false, PeriodicLoop::is_finished) {
                current.take()
            } else {
                None
            }
        };

        match finished {
            Some(worker) => {
                worker.stop().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Spawn a loop unless one is live. Returns false if one already was.
    ///
    /// A loop that exited on its own is joined first; its failure is logged.
    pub async fn start_with(&self, spawn: impl FnOnce() -> PeriodicLoop) -> bool {
        if let Err(e) = self.reap().await {
            warn!("Replacing failed loop: {}", e);
        }

        let mut current = self.lock();
        if current.as_ref().map_or(false, |worker| !worker.is_finished()) {
            return false;
        }
        *current = Some(spawn());
        true
    }

    /// Stop and join the current loop. Returns false if there was none.
    pub async fn stop(&self) -> BrainwaveResult<bool> {
        let worker = self.lock().take();
        match worker {
            Some(worker) => {
                worker.stop().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
