//! Log output for the binary.
//!
//! Records are printed by `tracing_subscriber::fmt` with local RFC 3339
//! timestamps. `RUST_LOG` overrides the configured level when it is set, so
//! per-module filters stay available for debugging.

use crate::config::LogLevel;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry(level: LogLevel) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| level.as_directive().into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;

    Ok(())
}
