#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, HuntConfig};
use core::time::Duration;
use idhunt::{
    CandidateGenerator, HttpsProbe, LogSink,
    pool::{Hunt, HuntHandle},
};
use telemetry::init_telemetry;
use tokio::{signal, time::MissedTickBehavior};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = HuntConfig::try_from(args)?;

    init_telemetry(config.log_level)?;
    log_startup_info(&config);

    let probe = HttpsProbe::new(config.endpoint.clone(), config.probe_timeout)?;
    let generator = CandidateGenerator::new(config.alphabet.clone(), config.id_length);
    let hunt = Hunt::new(config.pool, generator, probe, LogSink);
    let handle = hunt.handle();

    tokio::spawn(shutdown_signal(handle.clone()));
    let reporter = config
        .stats_interval
        .map(|every| tokio::spawn(report_stats(handle.clone(), every)));

    let report = hunt.run().await?;

    if let Some(reporter) = reporter {
        reporter.abort();
    }

    if report.drain.timed_out {
        tracing::warn!(
            "Abandoned {} probes after {:?}",
            report.drain.abandoned,
            report.drain.elapsed
        );
    }
    tracing::info!("Stopped: {}", report.stats);
    Ok(())
}

fn log_startup_info(config: &HuntConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Probing {}:{} with ids of length {} over {} characters",
            config.endpoint.host(),
            config.endpoint.port(),
            config.id_length.get(),
            config.alphabet.len()
        );
    }
}

/// Periodically logs the running counters until the run stops.
async fn report_stats(handle: HuntHandle, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = handle.stop_token().cancelled() => break,
            _ = ticker.tick() => {
                tracing::info!(in_flight = handle.in_flight(), "{}", handle.stats());
            }
        }
    }
}

/// Stops the hunt on Ctrl+C or SIGTERM. A second signal exits immediately
/// without waiting for the drain.
async fn shutdown_signal(handle: HuntHandle) {
    wait_for_signal().await;
    tracing::info!("Shutdown signal received, stopping intake...");
    handle.stop();

    wait_for_signal().await;
    tracing::warn!("Second signal received, exiting without draining");
    std::process::exit(130);
}

async fn wait_for_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::debug!("Received Ctrl+C signal"),
        () = terminate => tracing::debug!("Received SIGTERM signal"),
    }
}
