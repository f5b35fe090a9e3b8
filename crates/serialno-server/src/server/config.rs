use anyhow::{Context, bail};
use clap::Parser;
use core::time::Duration;
use serialno::{
    CounterPolicy, DEFAULT_BACKOFF_STEP, DEFAULT_LOCK_TIMEOUT, DEFAULT_MAX_CANDIDATES,
    DEFAULT_MAX_RETRIES, GeneratorConfig,
};
use std::{net::SocketAddr, path::PathBuf};

/// Runtime configuration for the `serialno-server` binary.
///
/// Every value can come from a CLI flag, an environment variable, or a `.env`
/// file in the working directory. Defaults match the library defaults.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "serialno-server",
    version,
    about = "An HTTP service for previewing and issuing pattern-formatted serial numbers"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Path of the redb database file. Created when missing.
    ///
    /// Without it formats, counters and the issued ledger live in memory and
    /// are lost on restart.
    ///
    /// Environment variable: `DB_PATH`
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Outer attempts per generation, including the first.
    ///
    /// Environment variable: `MAX_RETRIES`
    #[arg(long, env = "MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Candidates rendered and checked per attempt before giving up.
    ///
    /// Environment variable: `MAX_CANDIDATES`
    #[arg(long, env = "MAX_CANDIDATES", default_value_t = DEFAULT_MAX_CANDIDATES)]
    pub max_candidates: u64,

    /// Backoff unit in milliseconds. The wait after attempt `n` is `n` times
    /// this.
    ///
    /// Environment variable: `BACKOFF_MS`
    #[arg(long, env = "BACKOFF_MS", default_value_t = DEFAULT_BACKOFF_STEP.as_millis() as u64)]
    pub backoff_ms: u64,

    /// Longest wait for a format's row lock, in milliseconds.
    ///
    /// Environment variable: `LOCK_TIMEOUT_MS`
    #[arg(long, env = "LOCK_TIMEOUT_MS", default_value_t = DEFAULT_LOCK_TIMEOUT.as_millis() as u64)]
    pub lock_timeout_ms: u64,

    /// Reject format updates that lower `currentNumber`.
    ///
    /// Environment variable: `REJECT_COUNTER_DECREASE`
    #[arg(long, env = "REJECT_COUNTER_DECREASE", default_value_t = false)]
    pub reject_counter_decrease: bool,

    /// JSON file with an array of formats to create at startup. Formats whose
    /// key already exists are left alone.
    ///
    /// Environment variable: `SEED_FORMATS`
    #[arg(long, env = "SEED_FORMATS")]
    pub seed_formats: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub db_path: Option<PathBuf>,
    pub seed_formats: Option<PathBuf>,
    pub generator: GeneratorConfig,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_addr = args
            .server_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("SERVER_ADDR ({}) is not a socket address", args.server_addr))?;

        if args.max_retries == 0 {
            bail!("MAX_RETRIES must be greater than 0");
        }

        if args.max_candidates == 0 {
            bail!("MAX_CANDIDATES must be greater than 0");
        }

        if args.lock_timeout_ms == 0 {
            bail!("LOCK_TIMEOUT_MS must be greater than 0");
        }

        let counter_policy = if args.reject_counter_decrease {
            CounterPolicy::Monotonic
        } else {
            CounterPolicy::AllowDecrease
        };

        Ok(Self {
            server_addr,
            db_path: args.db_path,
            seed_formats: args.seed_formats,
            generator: GeneratorConfig {
                max_retries: args.max_retries,
                max_candidates: args.max_candidates,
                backoff_step: Duration::from_millis(args.backoff_ms),
                lock_timeout: Duration::from_millis(args.lock_timeout_ms),
                counter_policy,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(core::iter::once("serialno-server").chain(args.iter().copied()))?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn defaults_match_library() {
        let config = parse(&["--server-addr", "127.0.0.1:9000"]).unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.generator.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.generator.max_candidates, DEFAULT_MAX_CANDIDATES);
        assert_eq!(config.generator.backoff_step, DEFAULT_BACKOFF_STEP);
        assert_eq!(config.generator.lock_timeout, DEFAULT_LOCK_TIMEOUT);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--server-addr",
            "127.0.0.1:9000",
            "--max-retries",
            "2",
            "--backoff-ms",
            "10",
            "--reject-counter-decrease",
            "--db-path",
            "/var/lib/serialno/serials.redb",
        ])
        .unwrap();
        assert_eq!(config.generator.max_retries, 2);
        assert_eq!(config.generator.backoff_step, Duration::from_millis(10));
        assert_eq!(config.generator.counter_policy, CounterPolicy::Monotonic);
        assert_eq!(
            config.db_path.as_deref(),
            Some(std::path::Path::new("/var/lib/serialno/serials.redb"))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse(&["--server-addr", "not-an-address"]).is_err());
        assert!(parse(&["--server-addr", "127.0.0.1:9000", "--max-retries", "0"]).is_err());
        assert!(parse(&["--server-addr", "127.0.0.1:9000", "--max-candidates", "0"]).is_err());
        assert!(parse(&["--server-addr", "127.0.0.1:9000", "--lock-timeout-ms", "0"]).is_err());
    }
}
