use anyhow::{Context, bail};
use clap::Parser;
use core::num::NonZeroUsize;
use core::time::Duration;
use std::net::SocketAddr;

/// Runtime configuration for the `roster-server` binary.
///
/// These settings control the worker pool, the job queue, and the shutdown
/// behavior of the HTTP service. All values are parsed from CLI arguments or
/// environment variables (a `.env` file is honored), with defaults suitable
/// for local development.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "roster-server",
    version,
    about = "An HTTP service over an in-memory entity store with a background job pool"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Number of background workers consuming the job queue.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 3)]
    pub num_workers: usize,

    /// Maximum number of jobs buffered in the queue before submissions are
    /// rejected.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 100)]
    pub queue_capacity: usize,

    /// Duration of each simulated job, in milliseconds.
    ///
    /// Environment variable: `JOB_DURATION_MS`
    #[arg(long, env = "JOB_DURATION_MS", default_value_t = 100)]
    pub job_duration_ms: u64,

    /// Seconds the HTTP server is given to finish in-flight requests once the
    /// worker pool has stopped.
    ///
    /// Environment variable: `SHUTDOWN_GRACE_SECS`
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// Start with an empty store instead of the two demo entities.
    ///
    /// Environment variable: `NO_SEED`
    #[arg(long, env = "NO_SEED", default_value_t = false)]
    pub no_seed: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub num_workers: NonZeroUsize,
    pub queue_capacity: NonZeroUsize,
    pub job_duration: Duration,
    pub shutdown_grace: Duration,
    pub seed: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let Some(num_workers) = NonZeroUsize::new(args.num_workers) else {
            bail!("NUM_WORKERS must be greater than 0");
        };

        let Some(queue_capacity) = NonZeroUsize::new(args.queue_capacity) else {
            bail!("QUEUE_CAPACITY must be greater than 0");
        };

        let server_addr = args
            .server_addr
            .parse()
            .with_context(|| format!("invalid SERVER_ADDR `{}`", args.server_addr))?;

        Ok(Self {
            server_addr,
            num_workers,
            queue_capacity,
            job_duration: Duration::from_millis(args.job_duration_ms),
            shutdown_grace: Duration::from_secs(args.shutdown_grace_secs),
            seed: !args.no_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("roster-server").chain(extra.iter().copied()))?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn accepts_explicit_values() {
        let config = parse(&[
            "--server-addr",
            "127.0.0.1:9000",
            "--num-workers",
            "8",
            "--queue-capacity",
            "16",
            "--job-duration-ms",
            "5",
            "--shutdown-grace-secs",
            "1",
            "--no-seed",
        ])
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.num_workers.get(), 8);
        assert_eq!(config.queue_capacity.get(), 16);
        assert_eq!(config.job_duration, Duration::from_millis(5));
        assert_eq!(config.shutdown_grace, Duration::from_secs(1));
        assert!(!config.seed);
    }

    #[test]
    fn rejects_zero_workers() {
        let err = parse(&["--num-workers", "0"]).unwrap_err();
        assert!(err.to_string().contains("NUM_WORKERS"));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = parse(&["--queue-capacity", "0"]).unwrap_err();
        assert!(err.to_string().contains("QUEUE_CAPACITY"));
    }

    #[test]
    fn rejects_unparseable_address() {
        let err = parse(&["--server-addr", "not-an-addr"]).unwrap_err();
        assert!(err.to_string().contains("SERVER_ADDR"));
    }
}
