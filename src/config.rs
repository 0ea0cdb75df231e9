//! Runtime configuration
//!
//! `LedgerConfig` is built from the CLI (see `cli::CliArgs::to_ledger_config`)
//! or constructed directly by embedders and tests.

use crate::core::gateway::DEFAULT_REDIRECT_BASE;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

/// Default bound on a payment gateway call
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default number of operation records read per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound on opening a payment session
    pub gateway_timeout: Duration,

    /// Tokio worker threads for the replay runtime
    pub worker_threads: usize,

    /// Operation records read per batch
    pub batch_size: usize,

    /// Pin the clock to this instant instead of wall time
    ///
    /// Makes replays deterministic; `advance` operations move it forward.
    pub clock_start: Option<DateTime<Utc>>,

    /// Base URL the sandbox gateway builds redirect URLs from
    pub redirect_base: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            worker_threads: num_cpus::get(),
            batch_size: DEFAULT_BATCH_SIZE,
            clock_start: None,
            redirect_base: DEFAULT_REDIRECT_BASE.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Create a config, replacing zero values with defaults
    pub fn new(
        gateway_timeout: Duration,
        worker_threads: usize,
        batch_size: usize,
        clock_start: Option<DateTime<Utc>>,
        redirect_base: String,
    ) -> Self {
        let default = Self::default();

        let gateway_timeout = if gateway_timeout.is_zero() {
            warn!(
                default_ms = u64::try_from(default.gateway_timeout.as_millis()).unwrap_or(u64::MAX),
                "Invalid gateway timeout (0), using default"
            );
            default.gateway_timeout
        } else {
            gateway_timeout
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                default = default.worker_threads,
                "Invalid worker_threads (0), using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        let batch_size = if batch_size == 0 {
            warn!(default = default.batch_size, "Invalid batch_size (0), using default");
            default.batch_size
        } else {
            batch_size
        };

        Self {
            gateway_timeout,
            worker_threads,
            batch_size,
            clock_start,
            redirect_base,
        }
    }

    pub fn with_clock_start(mut self, start: DateTime<Utc>) -> Self {
        self.clock_start = Some(start);
        self
    }
}
