//! Asynchronous CSV reader with batch interface
//!
//! Streams ledger operations from a CSV source in fixed-size batches so the
//! replay never holds the whole file in memory.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord, Operation};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Keeps a running record count so skipped rows can be reported by position.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    records_seen: u64,
    records_skipped: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    ///
    /// Fields are trimmed and rows may omit trailing columns.
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            records_seen: 0,
            records_skipped: 0,
        }
    }

    /// Read a batch of operations
    ///
    /// Reads up to `batch_size` valid operations. Rows that fail to parse or
    /// convert are logged with their record number and skipped.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Maximum number of operations to return
    ///
    /// # Returns
    ///
    /// The converted operations in file order; empty at end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let next = records.next().await;
            if next.is_some() {
                self.records_seen += 1;
            }
            match next {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => {
                        self.records_skipped += 1;
                        warn!(record = self.records_seen, error = %e, "Skipping invalid operation");
                    }
                },
                Some(Err(e)) => {
                    self.records_skipped += 1;
                    warn!(record = self.records_seen, error = %e, "Skipping malformed CSV row");
                }
                None => break,
            }
        }

        batch
    }

    /// Rows rejected so far
    pub fn records_skipped(&self) -> u64 {
        self.records_skipped
    }
}
