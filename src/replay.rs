//! Operations replay driver
//!
//! Streams an operations CSV through a fresh [`RentalService`] and writes one
//! report snapshot when the input is exhausted.
//!
//! # Architecture
//!
//! ```text
//! Replayer
//!     ├── LedgerConfig (timeouts, batch size, worker threads, clock start)
//!     ├── AsyncReader (batch CSV reading)
//!     └── RentalService
//!         ├── FixedClock (when clock_start is set) or SystemClock
//!         └── SandboxGateway
//! ```
//!
//! Operations apply strictly in file order, one at a time, so a `webhook`
//! row always sees the `topup` rows above it. A rejected operation is logged
//! and skipped; only fatal errors stop the replay.

use crate::cli::ReportKind;
use crate::config::LedgerConfig;
use crate::core::clock::{Clock, FixedClock, SystemClock};
use crate::core::gateway::SandboxGateway;
use crate::core::service::RentalService;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::{
    write_accounts_csv, write_books_csv, write_deposits_csv, write_rentals_csv, Operation,
};
use crate::types::LedgerError;
use chrono::Duration;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts reported once a replay finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Operations that succeeded
    pub applied: u64,
    /// Operations the ledger refused
    pub rejected: u64,
    /// CSV rows that could not be turned into operations
    pub skipped_rows: u64,
}

#[derive(Debug, Clone)]
pub struct Replayer {
    config: LedgerConfig,
}

impl Replayer {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Replay every operation in `input_path` and write the chosen report
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the operations CSV
    /// * `report` - Snapshot to write once the input is exhausted
    /// * `output` - Destination for the report CSV
    ///
    /// # Returns
    ///
    /// * `Ok(ReplaySummary)` - Replay finished; rejected operations are counted, not returned
    /// * `Err(LedgerError::Io)` - Input could not be opened or output could not be written
    pub fn process(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_time()
            .build()?;

        runtime.block_on(async {
            let fixed_clock = self.config.clock_start.map(|start| Arc::new(FixedClock::new(start)));
            let clock: Arc<dyn Clock> = match &fixed_clock {
                Some(fixed) => fixed.clone(),
                None => Arc::new(SystemClock),
            };
            let gateway = Arc::new(SandboxGateway::new(self.config.redirect_base.clone()));
            let service = RentalService::new(&self.config, clock, gateway);

            let file = tokio::fs::File::open(input_path).await.map_err(|e| LedgerError::Io {
                message: format!("Failed to open file '{}': {}", input_path.display(), e),
            })?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut summary = ReplaySummary::default();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for operation in batch {
                    let kind = operation.kind();
                    match apply(&service, fixed_clock.as_deref(), operation).await {
                        Ok(()) => summary.applied += 1,
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            summary.rejected += 1;
                            warn!(operation = kind, error = %e, "Operation rejected");
                        }
                    }
                }
            }
            summary.skipped_rows = reader.records_skipped();

            info!(
                applied = summary.applied,
                rejected = summary.rejected,
                skipped_rows = summary.skipped_rows,
                "Replay finished"
            );

            match report {
                ReportKind::Accounts => write_accounts_csv(&service.accounts(), output)?,
                ReportKind::Books => write_books_csv(&service.books(), output)?,
                ReportKind::Rentals => write_rentals_csv(&service.rentals(), service.now(), output)?,
                ReportKind::Deposits => write_deposits_csv(&service.deposits(), output)?,
            }

            Ok(summary)
        })
    }
}

async fn apply(
    service: &RentalService,
    clock: Option<&FixedClock>,
    operation: Operation,
) -> Result<(), LedgerError> {
    match operation {
        Operation::OpenAccount { user, balance } => {
            service.open_account(user, balance)?;
        }
        Operation::AddBook {
            book,
            title,
            category,
            cost,
            copies,
        } => {
            service.add_book(book, title, category, cost, copies)?;
        }
        Operation::UpdateBook {
            book,
            title,
            category,
        } => {
            service.update_book_details(book, title, category)?;
        }
        Operation::RemoveBook { book } => {
            service.remove_book(book)?;
        }
        Operation::Restock { book, copies } => {
            service.restock(book, copies)?;
        }
        Operation::SetPrice { book, cost } => {
            service.set_rental_cost(book, cost)?;
        }
        Operation::Rent { user, book } => {
            service.create_rental(user, book)?;
        }
        Operation::Return { rental } => {
            service.return_book(rental)?;
        }
        Operation::TopUp {
            user,
            amount,
            order,
        } => {
            let session = match order {
                Some(order_id) => {
                    service
                        .initiate_top_up_with_order_id(user, amount, order_id)
                        .await?
                }
                None => service.initiate_top_up(user, amount).await?,
            };
            debug!(order_id = %session.order_id, redirect_url = %session.redirect_url, "Payment session ready");
        }
        Operation::Webhook { order, status } => {
            let outcome = service.handle_webhook(&order, &status)?;
            debug!(order_id = %order, ?outcome, "Webhook applied");
        }
        Operation::Advance { days } => match clock {
            Some(clock) => clock.advance(Duration::days(i64::from(days)))?,
            None => warn!(days, "Clock is not pinned (no clock start), ignoring advance"),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn replayer() -> Replayer {
        let config = LedgerConfig::default()
            .with_clock_start(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        Replayer::new(LedgerConfig {
            worker_threads: 1,
            batch_size: 2,
            ..config
        })
    }

    fn run(content: &str, report: ReportKind) -> (ReplaySummary, String) {
        let file = create_temp_csv(content);
        let mut output = Vec::new();
        let summary = replayer().process(file.path(), report, &mut output).unwrap();
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_rent_across_batches() {
        let csv = "type,user,book,rental,order,amount,copies,status\n\
            account,1,,,,10000,,\n\
            book,,7,,,5000,1,\n\
            rent,1,7,,,,,\n";

        let (summary, accounts) = run(csv, ReportKind::Accounts);

        assert_eq!(summary.applied, 3);
        assert_eq!(accounts, "user,balance,version\n1,5000,1\n");
    }

    #[test]
    fn test_rejected_operations_are_counted_and_skipped() {
        let csv = "type,user,book,rental,order,amount,copies,status\n\
            account,1,,,,100,,\n\
            book,,7,,,5000,1,\n\
            rent,1,7,,,,,\n\
            rent,1,,,,,,\n\
            webhook,,,,ORDER-9-9,,,settlement\n";

        let (summary, books) = run(csv, ReportKind::Books);

        assert_eq!(
            summary,
            ReplaySummary {
                applied: 2,
                rejected: 2,
                skipped_rows: 1,
            }
        );
        assert_eq!(
            books,
            "book,title,category,rental_cost,available\n7,Book 7,General,5000,1\n"
        );
    }

    #[test]
    fn test_generated_order_id_is_deterministic_with_pinned_clock() {
        let csv = "type,user,book,rental,order,amount,copies,status\n\
            account,4,,,,0,,\n\
            topup,4,,,,300,,\n\
            webhook,,,,ORDER-4-1704067200,,,capture\n";

        let (_, deposits) = run(csv, ReportKind::Deposits);

        assert_eq!(
            deposits,
            "id,user,order_id,amount,status,paid_at\n\
             1,4,ORDER-4-1704067200,300,Settled,2024-01-01T00:00:00Z\n"
        );
    }

    #[test]
    fn test_advance_without_pinned_clock_is_ignored() {
        let csv = "type,user,book,rental,order,amount,copies,status\n\
            account,1,,,,10000,,\n\
            book,,7,,,5000,1,\n\
            rent,1,7,,,,,\n\
            advance,,,,,30,,\n";
        let file = create_temp_csv(csv);
        let replayer = Replayer::new(LedgerConfig {
            worker_threads: 1,
            ..LedgerConfig::default()
        });
        let mut output = Vec::new();

        let summary = replayer
            .process(file.path(), ReportKind::Rentals, &mut output)
            .unwrap();

        assert_eq!(summary.applied, 4);
        let report = String::from_utf8(output).unwrap();
        assert!(report.contains(",Borrowed,5000"), "{}", report);
    }

    #[test]
    fn test_advance_past_max_instant_is_rejected_not_fatal() {
        let csv = "type,user,book,rental,order,amount,copies,status\n\
            account,1,,,,10000,,\n\
            advance,,,,,4294967295,,\n\
            book,,7,,,5000,1,\n\
            rent,1,7,,,,,\n";

        let (summary, rentals) = run(csv, ReportKind::Rentals);

        assert_eq!(
            summary,
            ReplaySummary {
                applied: 3,
                rejected: 1,
                skipped_rows: 0,
            }
        );
        assert!(
            rentals.contains(",2024-01-01,2024-01-08,Borrowed,5000"),
            "{}",
            rentals
        );
    }

    #[test]
    fn test_missing_input_file_is_fatal() {
        let mut output = Vec::new();

        let result = replayer().process(
            Path::new("/nonexistent/ops.csv"),
            ReportKind::Accounts,
            &mut output,
        );

        assert!(matches!(result, Err(LedgerError::Io { .. })));
        assert!(output.is_empty());
    }
}
