//! Error types for the probing engine.
//!
//! [`Error`] covers the failures that are allowed to stop a run: invalid
//! configuration detected before the dispatch loop starts, TLS setup problems
//! and a closed concurrency gate. Failures inside a single probe are not
//! represented here; they are folded into
//! [`ProbeOutcome::Error`](crate::probe::ProbeOutcome::Error) at the probe
//! boundary and never abort the run.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for engine setup and the dispatch loop.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A configuration value was rejected at startup.
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// The TLS client configuration could not be built.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The concurrency gate was closed while the dispatcher was waiting on it.
    #[error("Concurrency governor closed")]
    GovernorClosed,
}

impl Error {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
