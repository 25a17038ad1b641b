//! Dispatch loop, shutdown coordination and the [`Hunt`] that wires them.
//!
//! ## Structure
//!
//! - [`dispatcher`] - acquires slots and spawns probe tasks.
//! - [`shutdown`] - bounded drain of the live set once intake stops.
//! - [`state`] - shared [`RunState`].
//!
//! A [`Hunt`] owns one dispatcher and one coordinator. [`Hunt::run`] drives
//! both to completion; a [`HuntHandle`] taken beforehand observes the run and
//! requests the stop.

pub mod dispatcher;
pub mod shutdown;
pub mod state;

pub use dispatcher::{Dispatcher, LiveTasks};
pub use shutdown::{DrainReport, ShutdownCoordinator};
pub use state::{DispatcherState, RunState, SharedRunState};

use crate::{
    CandidateGenerator, ConcurrencyGovernor, HitSink, Probe, RandSource, Result, RunStats,
    StatsSnapshot, ThreadRandom,
};
use core::{num::NonZeroUsize, time::Duration};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Scheduling parameters of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of probes in flight at any instant.
    pub concurrency: NonZeroUsize,
    /// Shared deadline for in-flight probes once intake stops.
    pub drain_timeout: Duration,
    /// Stop intake after this many checks. `None` runs until cancelled.
    pub max_checks: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            max_checks: None,
        }
    }
}

/// Final state of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub stats: StatsSnapshot,
    pub drain: DrainReport,
}

/// Cloneable view of a running [`Hunt`].
#[derive(Clone, Debug)]
pub struct HuntHandle {
    stats: Arc<RunStats>,
    governor: Arc<ConcurrencyGovernor>,
    state: Arc<SharedRunState>,
    stop: CancellationToken,
}

impl HuntHandle {
    /// Requests a graceful stop. Safe to call more than once.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn dispatcher_state(&self) -> DispatcherState {
        self.state.get().into()
    }

    /// Probes currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.governor.in_use()
    }

    pub fn available_slots(&self) -> usize {
        self.governor.available()
    }

    pub fn capacity(&self) -> usize {
        self.governor.capacity()
    }
}

/// One probing run: a dispatcher and its shutdown coordinator.
pub struct Hunt<P, S, R = ThreadRandom> {
    dispatcher: Dispatcher<P, S, R>,
    coordinator: ShutdownCoordinator,
    handle: HuntHandle,
}

impl<P, S, R> Hunt<P, S, R>
where
    P: Probe,
    S: HitSink,
    R: RandSource,
{
    pub fn new(config: PoolConfig, generator: CandidateGenerator<R>, probe: P, sink: S) -> Self {
        let stats = Arc::new(RunStats::new());
        let governor = Arc::new(ConcurrencyGovernor::new(config.concurrency));
        let state = Arc::new(SharedRunState::new());

        let dispatcher = Dispatcher::new(
            Arc::new(probe),
            Arc::new(sink),
            generator,
            Arc::clone(&governor),
            Arc::clone(&stats),
            Arc::clone(&state),
            config.max_checks,
        );
        let coordinator =
            ShutdownCoordinator::new(config.drain_timeout, Arc::clone(&state), Arc::clone(&stats));

        Self {
            dispatcher,
            coordinator,
            handle: HuntHandle {
                stats,
                governor,
                state,
                stop: CancellationToken::new(),
            },
        }
    }

    pub fn handle(&self) -> HuntHandle {
        self.handle.clone()
    }

    /// Spawns probes until stopped, then drains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GovernorClosed`](crate::Error::GovernorClosed) if the
    /// dispatcher loses its concurrency gate.
    pub async fn run(self) -> Result<RunReport> {
        let Self {
            dispatcher,
            coordinator,
            handle,
        } = self;

        tracing::info!(
            "Starting probe loop with concurrency {}",
            handle.capacity()
        );

        let live = match dispatcher.run(handle.stop.clone()).await {
            Ok(live) => live,
            Err(e) => {
                handle.state.terminate();
                return Err(e);
            }
        };
        let drain = coordinator.drain(live).await;

        Ok(RunReport {
            stats: handle.stats(),
            drain,
        })
    }
}
