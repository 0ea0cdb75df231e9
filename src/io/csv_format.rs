//! CSV format handling for ledger operations and report output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to replayable operations
//! - Report serialization for accounts, books, rentals and deposits
//!
//! All functions are pure (no file handling) for easy testing.

use crate::types::{
    Account, BookId, BookStock, DepositTransaction, LedgerError, OrderId, RentalId, RentalRecord,
    UserId, DEFAULT_CATEGORY,
};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::Writer;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns:
/// type, user, book, rental, order, amount, copies, status, title, category
///
/// Only `type` is required. Which of the other columns must be present
/// depends on the operation; a missing column deserializes to `None`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    pub rental: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub copies: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// One replayable ledger operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    OpenAccount {
        user: UserId,
        balance: u64,
    },
    AddBook {
        book: BookId,
        title: String,
        category: String,
        cost: u64,
        copies: u32,
    },
    /// Rename a title and/or move it to another category
    UpdateBook {
        book: BookId,
        title: Option<String>,
        category: Option<String>,
    },
    RemoveBook {
        book: BookId,
    },
    Restock {
        book: BookId,
        copies: u32,
    },
    SetPrice {
        book: BookId,
        cost: u64,
    },
    Rent {
        user: UserId,
        book: BookId,
    },
    Return {
        rental: RentalId,
    },
    TopUp {
        user: UserId,
        amount: u64,
        order: Option<OrderId>,
    },
    Webhook {
        order: OrderId,
        status: String,
    },
    /// Move the replay clock forward
    Advance {
        days: u32,
    },
}

impl Operation {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::OpenAccount { .. } => "account",
            Operation::AddBook { .. } => "book",
            Operation::UpdateBook { .. } => "update",
            Operation::RemoveBook { .. } => "remove",
            Operation::Restock { .. } => "restock",
            Operation::SetPrice { .. } => "price",
            Operation::Rent { .. } => "rent",
            Operation::Return { .. } => "return",
            Operation::TopUp { .. } => "topup",
            Operation::Webhook { .. } => "webhook",
            Operation::Advance { .. } => "advance",
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<T: FromStr>(field: &Option<String>, column: &str, op_type: &str) -> Result<T, String> {
    let raw = non_empty(field)
        .ok_or_else(|| format!("'{}' operation requires a {} value", op_type, column))?;
    raw.parse()
        .map_err(|_| format!("Invalid {} '{}' for '{}' operation", column, raw, op_type))
}

/// Convert a CsvRecord to an Operation
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(Operation) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Operation, String> {
    let op_type = csv_record.op_type.trim().to_lowercase();
    let op = op_type.as_str();
    let r = &csv_record;

    let operation = match op {
        "account" => Operation::OpenAccount {
            user: required(&r.user, "user", op)?,
            balance: non_empty(&r.amount)
                .map(|_| required(&r.amount, "amount", op))
                .transpose()?
                .unwrap_or(0),
        },
        "book" => {
            let book: BookId = required(&r.book, "book", op)?;
            Operation::AddBook {
                book,
                title: non_empty(&r.title)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Book {}", book)),
                category: non_empty(&r.category)
                    .unwrap_or(DEFAULT_CATEGORY)
                    .to_string(),
                cost: required(&r.amount, "amount", op)?,
                copies: required(&r.copies, "copies", op)?,
            }
        }
        "update" => {
            let title = non_empty(&r.title).map(str::to_string);
            let category = non_empty(&r.category).map(str::to_string);
            if title.is_none() && category.is_none() {
                return Err("'update' operation requires a title or category value".to_string());
            }
            Operation::UpdateBook {
                book: required(&r.book, "book", op)?,
                title,
                category,
            }
        }
        "remove" => Operation::RemoveBook {
            book: required(&r.book, "book", op)?,
        },
        "restock" => Operation::Restock {
            book: required(&r.book, "book", op)?,
            copies: required(&r.copies, "copies", op)?,
        },
        "price" => Operation::SetPrice {
            book: required(&r.book, "book", op)?,
            cost: required(&r.amount, "amount", op)?,
        },
        "rent" => Operation::Rent {
            user: required(&r.user, "user", op)?,
            book: required(&r.book, "book", op)?,
        },
        "return" => Operation::Return {
            rental: required(&r.rental, "rental", op)?,
        },
        "topup" => Operation::TopUp {
            user: required(&r.user, "user", op)?,
            amount: required(&r.amount, "amount", op)?,
            order: non_empty(&r.order).map(OrderId::from),
        },
        "webhook" => Operation::Webhook {
            order: non_empty(&r.order)
                .map(OrderId::from)
                .ok_or_else(|| "'webhook' operation requires an order value".to_string())?,
            status: non_empty(&r.status)
                .map(str::to_string)
                .ok_or_else(|| "'webhook' operation requires a status value".to_string())?,
        },
        "advance" => Operation::Advance {
            days: required(&r.amount, "amount", op)?,
        },
        _ => return Err(format!("Invalid operation type: '{}'", csv_record.op_type)),
    };

    Ok(operation)
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write account balances to CSV format
///
/// Columns: user, balance, version. Sorted by user id.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["user", "balance", "version"])?;

    let mut sorted = accounts.to_vec();
    sorted.sort_by_key(|account| account.user);

    for account in sorted {
        writer.write_record(&[
            account.user.to_string(),
            account.balance.to_string(),
            account.version.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write book stock to CSV format
///
/// Columns: book, title, category, rental_cost, available. Sorted by book id.
pub fn write_books_csv(books: &[BookStock], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["book", "title", "category", "rental_cost", "available"])?;

    let mut sorted = books.to_vec();
    sorted.sort_by_key(|stock| stock.book);

    for stock in sorted {
        writer.write_record(&[
            stock.book.to_string(),
            stock.title,
            stock.category,
            stock.rental_cost.to_string(),
            stock.available.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write rental records to CSV format
///
/// Columns: id, user, book, rent_date, return_date, status, cost_charged.
/// Status is reported as of `now`, so a borrowed rental past its return
/// date prints as `Overdue`. Sorted by rental id.
pub fn write_rentals_csv(
    rentals: &[RentalRecord],
    now: DateTime<Utc>,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "id",
        "user",
        "book",
        "rent_date",
        "return_date",
        "status",
        "cost_charged",
    ])?;

    let mut sorted = rentals.to_vec();
    sorted.sort_by_key(|rental| rental.id);

    for rental in sorted {
        writer.write_record(&[
            rental.id.to_string(),
            rental.user.to_string(),
            rental.book.to_string(),
            format_date(rental.rent_date),
            rental.return_date.map(format_date).unwrap_or_default(),
            rental.status_at(now).to_string(),
            rental.cost_charged.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write deposit transactions to CSV format
///
/// Columns: id, user, order_id, amount, status, paid_at. The provider token
/// is left out; it differs on every run. Sorted by transaction id.
pub fn write_deposits_csv(
    deposits: &[DepositTransaction],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["id", "user", "order_id", "amount", "status", "paid_at"])?;

    let mut sorted = deposits.to_vec();
    sorted.sort_by_key(|tx| tx.id);

    for tx in sorted {
        writer.write_record(&[
            tx.id.to_string(),
            tx.user.to_string(),
            tx.order_id.to_string(),
            tx.amount.to_string(),
            tx.status.to_string(),
            tx.paid_at.map(format_instant).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
