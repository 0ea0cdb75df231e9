//! Rental Ledger CLI
//!
//! Replays an operations CSV through the ledger and prints a report.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- ops.csv > accounts.csv
//! cargo run -- --report rentals --clock-start 2024-01-01T00:00:00Z ops.csv > rentals.csv
//! RUST_LOG=rental_ledger=debug cargo run -- --report deposits ops.csv
//! ```
//!
//! Logs go to stderr; the report goes to stdout.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, output not writable)

use rental_ledger::cli;
use rental_ledger::logging;
use rental_ledger::replay::Replayer;
use std::process;
use tracing::error;

fn main() {
    let args = cli::parse_args();

    // Before the config so zero-value warnings are visible
    logging::init_logging(&args.log_level, args.log_json);

    let replayer = Replayer::new(args.to_ledger_config());

    let mut output = std::io::stdout();
    if let Err(e) = replayer.process(&args.input_file, args.report, &mut output) {
        error!(error = %e, "Replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
