//! # idhunt
//!
//! A bounded-concurrency engine that keeps generating random identifiers and
//! checks each one against a remote service.
//!
//! ## Overview
//!
//! - [`CandidateGenerator`] draws identifiers from an [`Alphabet`] using a
//!   [`RandSource`] (a CSPRNG by default).
//! - A [`Probe`] turns one candidate into a [`ProbeOutcome`];
//!   [`HttpsProbe`] does so with one TLS round trip per candidate.
//! - The [`ConcurrencyGovernor`] caps in-flight probes. Each probe task owns
//!   a [`Slot`] that is released when the task ends, however it ends.
//! - The [`Dispatcher`](pool::Dispatcher) spawns probes until stopped and the
//!   [`ShutdownCoordinator`](pool::ShutdownCoordinator) drains them under a
//!   single deadline.
//! - [`RunStats`] counts checks and hits; hits go to a [`HitSink`].
//!
//! ## Example
//!
//! ```no_run
//! use idhunt::{
//!     Alphabet, CandidateGenerator, Endpoint, HttpsProbe, IdLength, LogSink,
//!     pool::{Hunt, PoolConfig},
//! };
//!
//! # async fn demo() -> idhunt::Result<()> {
//! let generator = CandidateGenerator::new(Alphabet::default(), IdLength::default());
//! let probe = HttpsProbe::new(Endpoint::default(), None)?;
//! let hunt = Hunt::new(PoolConfig::default(), generator, probe, LogSink);
//!
//! let handle = hunt.handle();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     handle.stop();
//! });
//!
//! let report = hunt.run().await?;
//! println!("{}", report.stats);
//! # Ok(())
//! # }
//! ```

mod candidate;
mod error;
mod governor;
pub mod pool;
pub mod probe;
mod rand;
mod stats;

pub use crate::candidate::*;
pub use crate::error::*;
pub use crate::governor::*;
pub use crate::probe::{Endpoint, HttpsProbe, Probe, ProbeError, ProbeOutcome};
pub use crate::rand::*;
pub use crate::stats::*;
