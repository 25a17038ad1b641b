//! Two-phase stop: bounded drain, then abandon.
//!
//! By the time [`ShutdownCoordinator::drain`] runs, the dispatcher has
//! stopped taking slots. The coordinator waits for the live set under one
//! shared deadline. Whatever is still running afterwards is aborted, and the
//! aborted set is joined so that only tasks that were actually cancelled
//! count as abandoned. A task that finished its outcome in the meantime is
//! counted as completed instead.

use super::{
    dispatcher::{LiveTasks, reap},
    state::SharedRunState,
};
use crate::RunStats;
use core::time::Duration;
use std::sync::Arc;
use tokio::time::{Instant, timeout};

/// Result of a drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks that finished within the deadline.
    pub completed: usize,
    /// Tasks aborted when the deadline elapsed.
    pub abandoned: usize,
    /// Whether the deadline elapsed with tasks still running.
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Waits for in-flight probes with a single deadline, then abandons the rest.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    drain_timeout: Duration,
    state: Arc<SharedRunState>,
    stats: Arc<RunStats>,
}

impl ShutdownCoordinator {
    pub const fn new(
        drain_timeout: Duration,
        state: Arc<SharedRunState>,
        stats: Arc<RunStats>,
    ) -> Self {
        Self {
            drain_timeout,
            state,
            stats,
        }
    }

    pub const fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Drains `live` and moves the run to `Terminated`.
    ///
    /// Waits for probes no longer than the drain timeout, regardless of how
    /// long individual probes would take. After the deadline it only waits
    /// for the runtime to cancel the aborted tasks, which drops their
    /// connections and slots before this returns.
    pub async fn drain(&self, mut live: LiveTasks) -> DrainReport {
        let started = Instant::now();
        self.state.begin_drain();

        let outstanding = live.len();
        if outstanding > 0 {
            tracing::info!(
                "Draining {outstanding} in-flight probes (timeout {:?})",
                self.drain_timeout
            );
        }

        let mut completed = 0;
        let drained = timeout(self.drain_timeout, async {
            while let Some(joined) = live.tasks.join_next().await {
                reap(joined);
                completed += 1;
            }
        })
        .await;

        let timed_out = drained.is_err();
        let mut abandoned = 0;
        if timed_out {
            tracing::warn!(
                "Drain timed out after {:?}, abandoning {} probes",
                self.drain_timeout,
                live.len()
            );
            live.tasks.abort_all();
            while let Some(joined) = live.tasks.join_next().await {
                match joined {
                    Err(e) if e.is_cancelled() => abandoned += 1,
                    // Finished or panicked before the abort landed.
                    other => {
                        reap(other);
                        completed += 1;
                    }
                }
            }
            self.stats.record_abandoned(abandoned as u64);
        } else if outstanding > 0 {
            tracing::debug!("All in-flight probes drained");
        }

        self.state.terminate();

        DrainReport {
            completed,
            abandoned,
            timed_out,
            elapsed: started.elapsed(),
        }
    }
}
