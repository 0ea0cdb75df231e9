use crate::config::LedgerConfig;
use crate::core::gateway::DEFAULT_REDIRECT_BASE;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay book-rental ledger operations and print a report
#[derive(Parser, Debug)]
#[command(name = "rental-ledger")]
#[command(about = "Replay book-rental ledger operations and print a report", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing ledger operations
    #[arg(value_name = "INPUT", help = "Path to the operations CSV file")]
    pub input_file: PathBuf,

    /// Which snapshot to print once the replay finishes
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "accounts",
        env = "RENTAL_LEDGER_REPORT",
        help = "Report to print: accounts, books, rentals or deposits"
    )]
    pub report: ReportKind,

    /// Upper bound on a payment gateway call, in milliseconds
    #[arg(
        long = "gateway-timeout-ms",
        value_name = "MS",
        env = "RENTAL_LEDGER_GATEWAY_TIMEOUT_MS",
        help = "Gateway call timeout in milliseconds (default: 5000)"
    )]
    pub gateway_timeout_ms: Option<u64>,

    /// Tokio worker threads for the replay runtime
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        env = "RENTAL_LEDGER_WORKER_THREADS",
        help = "Runtime worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Number of operation records read per batch
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        env = "RENTAL_LEDGER_BATCH_SIZE",
        help = "Operation records per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Pin the replay clock to an RFC 3339 instant
    #[arg(
        long = "clock-start",
        value_name = "RFC3339",
        env = "RENTAL_LEDGER_CLOCK_START",
        help = "Start the replay clock at this instant (e.g. 2024-01-01T00:00:00Z)"
    )]
    pub clock_start: Option<DateTime<Utc>>,

    /// Base URL for sandbox payment redirects
    #[arg(
        long = "redirect-base",
        value_name = "URL",
        default_value = DEFAULT_REDIRECT_BASE,
        env = "RENTAL_LEDGER_REDIRECT_BASE"
    )]
    pub redirect_base: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        env = "RENTAL_LEDGER_LOG_LEVEL"
    )]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long = "log-json", env = "RENTAL_LEDGER_LOG_JSON")]
    pub log_json: bool,
}

/// Snapshots the replay can print
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Accounts,
    Books,
    Rentals,
    Deposits,
}

impl CliArgs {
    /// Create a LedgerConfig from CLI arguments
    ///
    /// Missing values fall back to defaults. Zero values are replaced by
    /// `LedgerConfig::new`, which logs a warning for each.
    ///
    /// # Returns
    ///
    /// A `LedgerConfig` with values from CLI arguments or defaults.
    pub fn to_ledger_config(&self) -> LedgerConfig {
        let default = LedgerConfig::default();
        LedgerConfig::new(
            self.gateway_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default.gateway_timeout),
            self.worker_threads.unwrap_or(default.worker_threads),
            self.batch_size.unwrap_or(default.batch_size),
            self.clock_start,
            self.redirect_base.clone(),
        )
    }
}
