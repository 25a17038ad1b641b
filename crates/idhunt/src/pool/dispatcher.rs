//! The spawn loop.
//!
//! The [`Dispatcher`] repeatedly takes a [`Slot`] from the
//! [`ConcurrencyGovernor`], generates a candidate, counts the check and spawns
//! a probe task that owns both. The task gives the slot back when it ends,
//! whether the probe answered, failed, panicked or was aborted. Finished tasks
//! are reaped from the live set while the loop waits for capacity.
//!
//! The loop stops when the shared [`CancellationToken`] fires or when the
//! optional check budget is spent. It then hands the live set to the
//! [`ShutdownCoordinator`](super::shutdown::ShutdownCoordinator).

use super::state::SharedRunState;
use crate::{
    CandidateGenerator, ConcurrencyGovernor, Discovery, HitSink, Probe, ProbeOutcome, RandSource,
    Result, RunStats, Slot,
};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Probe tasks that were still running when the dispatcher stopped.
#[derive(Debug)]
pub struct LiveTasks {
    pub(crate) tasks: JoinSet<()>,
}

impl LiveTasks {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Spawns probe tasks under the governor's concurrency limit.
pub struct Dispatcher<P, S, R> {
    probe: Arc<P>,
    sink: Arc<S>,
    generator: CandidateGenerator<R>,
    governor: Arc<ConcurrencyGovernor>,
    stats: Arc<RunStats>,
    state: Arc<SharedRunState>,
    max_checks: Option<u64>,
}

impl<P, S, R> Dispatcher<P, S, R>
where
    P: Probe,
    S: HitSink,
    R: RandSource,
{
    pub fn new(
        probe: Arc<P>,
        sink: Arc<S>,
        generator: CandidateGenerator<R>,
        governor: Arc<ConcurrencyGovernor>,
        stats: Arc<RunStats>,
        state: Arc<SharedRunState>,
        max_checks: Option<u64>,
    ) -> Self {
        Self {
            probe,
            sink,
            generator,
            governor,
            stats,
            state,
            max_checks,
        }
    }

    /// Runs the spawn loop until `stop` is cancelled or the check budget is
    /// spent, then moves the run to `Draining`.
    ///
    /// Once this returns no further slot is acquired and no probe is spawned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GovernorClosed`](crate::Error::GovernorClosed) if the
    /// governor is closed underneath the loop. Live tasks are aborted in that
    /// case.
    pub async fn run(mut self, stop: CancellationToken) -> Result<LiveTasks> {
        let governor = Arc::clone(&self.governor);
        let mut tasks = JoinSet::new();
        let mut spawned: u64 = 0;

        let outcome = loop {
            if self.max_checks.is_some_and(|max| spawned >= max) {
                tracing::info!("Check budget of {spawned} reached, stopping intake");
                break Ok(());
            }

            tokio::select! {
                biased;

                () = stop.cancelled() => {
                    tracing::info!("Stop requested, halting intake");
                    break Ok(());
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    reap(joined);
                }
                slot = governor.acquire() => match slot {
                    Ok(slot) => {
                        self.spawn_probe(&mut tasks, slot);
                        spawned += 1;
                    }
                    Err(e) => {
                        tracing::error!("Dispatcher cannot acquire slots: {e}");
                        break Err(e);
                    }
                },
            }
        };

        self.state.begin_drain();
        tracing::debug!(spawned, live = tasks.len(), "Dispatcher stopped");
        outcome.map(|()| LiveTasks { tasks })
    }

    fn spawn_probe(&mut self, tasks: &mut JoinSet<()>, slot: Slot) {
        let candidate = self.generator.generate();
        self.stats.record_check();

        let probe = Arc::clone(&self.probe);
        let sink = Arc::clone(&self.sink);
        let stats = Arc::clone(&self.stats);
        let span = tracing::debug_span!("probe", %candidate);

        tasks.spawn(
            async move {
                let outcome = probe.probe(&candidate).await;
                record_outcome(probe.as_ref(), sink.as_ref(), &stats, outcome);
                slot.release();
            }
            .instrument(span),
        );
    }
}

/// Folds one outcome into the counters and reports hits.
pub(crate) fn record_outcome<P, S>(probe: &P, sink: &S, stats: &RunStats, outcome: ProbeOutcome)
where
    P: Probe,
    S: HitSink,
{
    match outcome {
        ProbeOutcome::Hit { candidate, status } => {
            stats.record_hit();
            let url = probe.share_url(&candidate);
            sink.report(&Discovery {
                candidate,
                status,
                url,
            });
        }
        ProbeOutcome::Miss { candidate, status } => {
            stats.record_miss();
            tracing::trace!(%candidate, status, "miss");
        }
        ProbeOutcome::Error { candidate, error } => {
            stats.record_error();
            tracing::debug!(%candidate, "probe failed: {error}");
        }
    }
}

/// Logs a task that ended without recording an outcome.
pub(crate) fn reap(joined: core::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::warn!("Probe task panicked: {e}");
        } else {
            tracing::trace!("Probe task cancelled");
        }
    }
}
