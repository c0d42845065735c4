//! Controller loop.
//!
//! Maps store events to spec keys, feeds them through the [`WorkQueue`] and
//! runs a fixed pool of workers that call the [`Reconciler`]. Failed keys are
//! requeued after a fixed delay; cancelled invocations are not requeued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pokesync_core::{SYNC_SPEC_KIND, StoreEvent};
use pokesync_storage::DynSpecStore;

use crate::queue::WorkQueue;
use crate::reconciler::Reconciler;

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Delay before a failed key is reconciled again.
    pub requeue_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            requeue_delay: Duration::from_secs(5),
        }
    }
}

pub struct Controller {
    reconciler: Reconciler,
    specs: DynSpecStore,
    queue: Arc<WorkQueue>,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(reconciler: Reconciler, specs: DynSpecStore, config: ControllerConfig) -> Self {
        Self {
            reconciler,
            specs,
            queue: Arc::new(WorkQueue::new()),
            config,
        }
    }

    /// Runs until `shutdown` is cancelled.
    ///
    /// Every existing spec is queued on start and again whenever the event
    /// receiver lags, so missed events never leave a spec unreconciled.
    pub async fn run(self, mut events: broadcast::Receiver<StoreEvent>, shutdown: CancellationToken) {
        let workers = self.config.workers.max(1);
        info!(
            workers,
            requeue_delay_ms = self.config.requeue_delay.as_millis() as u64,
            "Controller started"
        );

        self.resync().await;

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            tasks.spawn(worker(
                id,
                self.reconciler.clone(),
                Arc::clone(&self.queue),
                self.config.requeue_delay,
                shutdown.clone(),
            ));
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => {
                        if let Some(key) = event.reconcile_key(SYNC_SPEC_KIND) {
                            debug!(key = %key, event = %event.event_type, kind = %event.object_kind, "Queueing reconcile");
                            self.queue.add(key).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Controller lagged behind the event bus, resyncing");
                        self.resync().await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event bus closed");
                        shutdown.cancelled().await;
                        break;
                    }
                },
            }
        }

        self.queue.shut_down().await;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Controller worker panicked");
            }
        }
        info!("Controller stopped");
    }

    async fn resync(&self) {
        match self.specs.list().await {
            Ok(specs) => {
                debug!(count = specs.len(), "Queueing all specs");
                for spec in specs {
                    self.queue.add(spec.spec.key).await;
                }
            }
            Err(e) => warn!(error = %e, "Failed to list specs for resync"),
        }
    }
}

async fn worker(
    id: usize,
    reconciler: Reconciler,
    queue: Arc<WorkQueue>,
    requeue_delay: Duration,
    shutdown: CancellationToken,
) {
    debug!(worker = id, "Worker started");
    while let Some(key) = queue.get().await {
        let cancel = shutdown.child_token();
        match reconciler.reconcile(&key, &cancel).await {
            Ok(action) => {
                if let Some(delay) = action.requeue_after {
                    queue.add_after(key.clone(), delay);
                }
            }
            Err(e) if e.is_cancelled() => {}
            Err(_) => queue.add_after(key.clone(), requeue_delay),
        }
        queue.done(&key).await;
    }
    debug!(worker = id, "Worker stopped");
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("reconciler", &self.reconciler)
            .field("config", &self.config)
            .finish()
    }
}
