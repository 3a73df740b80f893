use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use super::parsers::{parse_duration_arg, parse_method, parse_positive_u64};
use super::types::{HttpMethod, PositiveU64};

#[derive(Debug, Parser, Clone)]
#[clap(
    name = "swvbench",
    version,
    about = "A network service benchmark tool - a fixed pool of workers fires batches of requests at one endpoint while per-second throughput is logged to stat-<timestamp>.log."
)]
pub struct BenchArgs {
    /// Number of concurrent workers
    #[arg(
        long = "worker-num",
        short = 'w',
        default_value = "100",
        value_parser = parse_positive_u64,
        allow_negative_numbers = true
    )]
    pub worker_num: PositiveU64,

    /// Requests sent sequentially by each worker
    #[arg(
        long = "batch-size",
        short = 'b',
        default_value = "1",
        value_parser = parse_positive_u64,
        allow_negative_numbers = true
    )]
    pub batch_size: PositiveU64,

    /// Endpoint of the service under test
    #[arg(long, short = 'e')]
    pub endpoint: Option<String>,

    /// HTTP method (case-insensitive)
    #[arg(long, short = 'm', default_value = "GET", value_parser = parse_method)]
    pub method: HttpMethod,

    /// JSON object with request headers, e.g. {"Content-Type": "application/json"}
    #[arg(long = "header-file", short = 'H')]
    pub header_file: Option<PathBuf>,

    /// Request body template; every ${SEQ} is replaced by the request sequence number
    #[arg(long = "body-file", short = 'd')]
    pub body_file: Option<PathBuf>,

    /// Statistics tick in milliseconds
    #[arg(
        long = "tick-interval",
        default_value = "1000",
        value_parser = parse_positive_u64,
        allow_negative_numbers = true
    )]
    pub tick_interval_ms: PositiveU64,

    /// Directory receiving the stat-<timestamp>.log file
    #[arg(long = "log-dir", default_value = ".")]
    pub log_dir: PathBuf,

    /// Per-request timeout (supports ms/s/m/h); unlimited when unset
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub request_timeout: Option<Duration>,

    /// Connection establishment timeout (supports ms/s/m/h)
    #[arg(long = "connect-timeout", default_value = "120s", value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// Do not reuse idle connections between requests
    #[arg(long = "disable-keepalive")]
    pub disable_keepalive: bool,

    /// Path to config file (TOML/JSON). Defaults to ./swvbench.toml or ./swvbench.json if present.
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by SWVBENCH_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
