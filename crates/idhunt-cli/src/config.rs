use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::{num::NonZeroUsize, time::Duration};
use idhunt::{
    Alphabet, DEFAULT_ID_CHARS, DEFAULT_ID_LENGTH, Endpoint, IdLength,
    pool::{DEFAULT_CONCURRENCY, PoolConfig},
    probe::endpoint::{DEFAULT_HOST, DEFAULT_PORT},
};

/// Runtime configuration for the `idhunt` binary.
///
/// All values are read once at startup from CLI arguments or environment
/// variables (a `.env` file is honored). Nothing is reconfigurable while the
/// probe loop runs.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "idhunt",
    version,
    about = "Probes randomly generated identifiers against a remote service until interrupted"
)]
pub struct CliArgs {
    /// Minimum level of log records to print. `RUST_LOG`, when set, takes
    /// precedence.
    ///
    /// Environment variable: `LOG_LEVEL`
    #[arg(short, long, env = "LOG_LEVEL", value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Maximum number of probes in flight at once.
    ///
    /// Environment variable: `CONCURRENCY`
    #[arg(short, long, env = "CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Characters identifiers are drawn from. Duplicates are ignored.
    ///
    /// Environment variable: `ID_CHARS`
    #[arg(long, env = "ID_CHARS", value_name = "abc...", default_value = DEFAULT_ID_CHARS)]
    pub id_chars: String,

    /// Length of every generated identifier.
    ///
    /// Environment variable: `ID_LENGTH`
    #[arg(long, env = "ID_LENGTH", value_name = "[1-100]", default_value_t = DEFAULT_ID_LENGTH)]
    pub id_length: usize,

    /// How long to wait for in-flight probes after a stop is requested before
    /// abandoning them.
    ///
    /// Environment variable: `DRAIN_TIMEOUT_SECS`
    #[arg(long, env = "DRAIN_TIMEOUT_SECS", default_value_t = 10)]
    pub drain_timeout_secs: u64,

    /// Upper bound for one probe round trip in milliseconds. `0` disables the
    /// bound.
    ///
    /// Environment variable: `PROBE_TIMEOUT_MS`
    #[arg(long, env = "PROBE_TIMEOUT_MS", default_value_t = 10_000)]
    pub probe_timeout_ms: u64,

    /// Stop after this many checks instead of running until interrupted.
    ///
    /// Environment variable: `MAX_CHECKS`
    #[arg(long, env = "MAX_CHECKS")]
    pub max_checks: Option<u64>,

    /// Log running counters at this interval in seconds. `0` disables.
    ///
    /// Environment variable: `STATS_INTERVAL_SECS`
    #[arg(long, env = "STATS_INTERVAL_SECS", default_value_t = 0)]
    pub stats_interval_secs: u64,

    /// Host every candidate is probed against.
    ///
    /// Environment variable: `TARGET_HOST`
    #[arg(long, env = "TARGET_HOST", default_value = DEFAULT_HOST)]
    pub target_host: String,

    /// TLS port on the target host.
    ///
    /// Environment variable: `TARGET_PORT`
    #[arg(long, env = "TARGET_PORT", default_value_t = DEFAULT_PORT)]
    pub target_port: u16,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[value(alias = "warning")]
    Warn,
    #[value(alias = "critical", alias = "fatal")]
    Error,
}

impl LogLevel {
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HuntConfig {
    pub log_level: LogLevel,
    pub pool: PoolConfig,
    pub alphabet: Alphabet,
    pub id_length: IdLength,
    pub endpoint: Endpoint,
    pub probe_timeout: Option<Duration>,
    pub stats_interval: Option<Duration>,
}

impl TryFrom<CliArgs> for HuntConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let Some(concurrency) = NonZeroUsize::new(args.concurrency) else {
            bail!("CONCURRENCY must be greater than 0");
        };

        if args.max_checks == Some(0) {
            bail!("MAX_CHECKS must be greater than 0 when set");
        }

        let alphabet = Alphabet::new(&args.id_chars)?;
        let id_length = IdLength::new(args.id_length)?;
        let endpoint = Endpoint::with_target(args.target_host, args.target_port)?;

        let nonzero = |d: Duration| (!d.is_zero()).then_some(d);

        Ok(Self {
            log_level: args.log_level,
            pool: PoolConfig {
                concurrency,
                drain_timeout: Duration::from_secs(args.drain_timeout_secs),
                max_checks: args.max_checks,
            },
            alphabet,
            id_length,
            endpoint,
            probe_timeout: nonzero(Duration::from_millis(args.probe_timeout_ms)),
            stats_interval: nonzero(Duration::from_secs(args.stats_interval_secs)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<HuntConfig> {
        let argv = std::iter::once("idhunt").chain(args.iter().copied());
        HuntConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.pool.concurrency.get(), 20);
        assert_eq!(config.pool.drain_timeout, Duration::from_secs(10));
        assert_eq!(config.pool.max_checks, None);
        assert_eq!(config.alphabet.len(), 64);
        assert_eq!(config.id_length.get(), 11);
        assert_eq!(config.endpoint, Endpoint::default());
        assert_eq!(config.probe_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.stats_interval, None);
    }

    #[test]
    fn short_flags_and_aliases() {
        let config = parse(&["-c", "4", "-l", "CRITICAL", "--id-chars", "ab", "--id-length", "2"])
            .unwrap();
        assert_eq!(config.pool.concurrency.get(), 4);
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.alphabet.as_chars(), &['a', 'b']);
        assert_eq!(config.id_length.get(), 2);
    }

    #[test]
    fn zero_disables_optional_timers() {
        let config = parse(&["--probe-timeout-ms", "0", "--stats-interval-secs", "0"]).unwrap();
        assert_eq!(config.probe_timeout, None);
        assert_eq!(config.stats_interval, None);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(parse(&["-c", "0"]).is_err());
        assert!(parse(&["--id-chars", ""]).is_err());
        assert!(parse(&["--id-length", "0"]).is_err());
        assert!(parse(&["--id-length", "101"]).is_err());
        assert!(parse(&["--max-checks", "0"]).is_err());
        assert!(parse(&["--target-port", "0"]).is_err());
        assert!(parse(&["-l", "verbose"]).is_err());
    }
}
