use portable_atomic::{AtomicU8, Ordering};

/// Lifecycle of a run. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// The dispatcher is spawning probes.
    Running = 0,
    /// Intake has stopped; in-flight probes are being drained.
    Draining = 1,
    /// The drain finished or timed out.
    Terminated = 2,
}

impl RunState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Terminated,
        }
    }
}

/// What the dispatcher loop is doing, derived from [`RunState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatcherState {
    Spawning,
    Stopped,
}

impl From<RunState> for DispatcherState {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Running => Self::Spawning,
            RunState::Draining | RunState::Terminated => Self::Stopped,
        }
    }
}

/// Shared, atomically updated [`RunState`].
#[derive(Debug)]
pub struct SharedRunState(AtomicU8);

impl SharedRunState {
    pub const fn new() -> Self {
        Self(AtomicU8::new(RunState::Running as u8))
    }

    pub fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Running -> Draining`. Returns `false` if the run had already left
    /// `Running`.
    pub fn begin_drain(&self) -> bool {
        self.0
            .compare_exchange(
                RunState::Running as u8,
                RunState::Draining as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves to `Terminated` from any state.
    pub fn terminate(&self) {
        self.0.store(RunState::Terminated as u8, Ordering::Release);
    }
}

impl Default for SharedRunState {
    fn default() -> Self {
        Self::new()
    }
}
