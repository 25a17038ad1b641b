//! Run counters and the hit reporting sink.
//!
//! [`RunStats`] is shared between the dispatcher and every probe task. All
//! updates are single atomic increments; readers use [`RunStats::snapshot`],
//! which preserves `hits <= checks`.

use crate::Candidate;
use core::fmt;
use portable_atomic::{AtomicU64, Ordering};

/// Shared, monotonically increasing run counters.
#[derive(Debug, Default)]
pub struct RunStats {
    checks: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    abandoned: AtomicU64,
}

impl RunStats {
    pub const fn new() -> Self {
        Self {
            checks: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
        }
    }

    /// Counts a spawned probe. Called once per task, before it is spawned.
    pub fn record_check(&self) {
        self.checks.fetch_add(1, Ordering::Release);
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Release);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self, count: u64) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Acquire)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Acquire)
    }

    /// Reads every counter.
    ///
    /// `hits` is loaded before `checks`: a hit is only recorded by a task
    /// whose check was recorded before it was spawned, so the later `checks`
    /// load can never be smaller.
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Acquire);
        let misses = self.misses.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let abandoned = self.abandoned.load(Ordering::Relaxed);
        let checks = self.checks.load(Ordering::Acquire);
        StatsSnapshot {
            checks,
            hits,
            misses,
            errors,
            abandoned,
        }
    }
}

/// Point-in-time copy of [`RunStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub checks: u64,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub abandoned: u64,
}

impl StatsSnapshot {
    /// Probes that were counted but have not produced an outcome yet.
    pub const fn pending(&self) -> u64 {
        self.checks
            .saturating_sub(self.hits + self.misses + self.errors + self.abandoned)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checks={} hits={} misses={} errors={} abandoned={}",
            self.checks, self.hits, self.misses, self.errors, self.abandoned
        )
    }
}

/// A confirmed candidate together with its shareable link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discovery {
    pub candidate: Candidate,
    pub status: u16,
    pub url: String,
}

/// Receives one record per confirmed hit.
pub trait HitSink: Send + Sync + 'static {
    fn report(&self, discovery: &Discovery);
}

/// Emits hits through `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl HitSink for LogSink {
    fn report(&self, discovery: &Discovery) {
        tracing::info!(candidate = %discovery.candidate, "Hit: {}", discovery.url);
    }
}
