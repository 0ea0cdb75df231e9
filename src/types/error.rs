//! Error types for the rental ledger
//!
//! Every domain outcome that is not a success is a variant of [`LedgerError`].
//! All of them are recoverable and returned to the caller; only storage and
//! I/O failures are treated as fatal (see [`LedgerError::is_fatal`]).
//!
//! # Error Categories
//!
//! - **Stock / balance**: out of stock, insufficient funds, overflow
//! - **Catalogue**: invalid book details, removal while copies are on loan
//! - **Lookup**: unknown account, book, rental, or order
//! - **State machine**: invalid rental or deposit transition, unknown provider status
//! - **Concurrency**: optimistic version mismatch
//! - **External**: payment gateway unavailable, storage unavailable, I/O

use super::ids::{BookId, OrderId, RentalId, UserId};
use thiserror::Error;

/// Main error type for the rental ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No copy of the book is available to reserve
    #[error("Book {book} is out of stock")]
    OutOfStock {
        /// Book that could not be reserved
        book: BookId,
    },

    /// Debit would take the balance below zero
    ///
    /// The balance is left unchanged.
    #[error("Insufficient funds for user {user}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// User ID
        user: UserId,
        /// Balance at the time of the attempt
        balance: u64,
        /// Requested debit
        requested: u64,
    },

    #[error("Account {user} not found")]
    AccountNotFound { user: UserId },

    #[error("Book {book} not found")]
    BookNotFound { book: BookId },

    /// Catalogue entry rejected: empty title or category, or a zero fee
    #[error("Invalid book {book}: {reason}")]
    InvalidBook { book: BookId, reason: String },

    /// Title still has copies out with renters and cannot be removed
    #[error("Book {book} has {on_loan} copies on loan")]
    BookOnLoan { book: BookId, on_loan: u32 },

    #[error("Rental {rental} not found")]
    RentalNotFound { rental: RentalId },

    /// Requested transition is not in the state machine's table
    #[error("Rental {rental} cannot move from {from} to {to}")]
    InvalidState {
        /// Rental ID
        rental: RentalId,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Deposit status change not in the deposit transition table
    #[error("Deposit {order_id} cannot move from {from} to {to}")]
    InvalidDepositTransition {
        order_id: OrderId,
        from: String,
        to: String,
    },

    /// Webhook referenced an order id with no deposit transaction
    #[error("Unknown order {order_id}")]
    UnknownOrder { order_id: OrderId },

    /// Provider status could not be mapped; the transaction stays pending
    #[error("Unknown provider status '{status}' for order {order_id}")]
    UnknownStatus { order_id: OrderId, status: String },

    /// Payment provider timed out or returned an error
    #[error("Payment gateway unavailable: {message}")]
    GatewayUnavailable { message: String },

    /// Optimistic version check failed; the caller should re-read and retry
    #[error("Concurrent update on account {user}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// User ID
        user: UserId,
        /// Version the caller read
        expected: u64,
        /// Version found at write time
        actual: u64,
    },

    /// Amount must be a positive integer
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount { amount: u64, operation: String },

    #[error("Account {user} already exists")]
    DuplicateAccount { user: UserId },

    #[error("Book {book} already exists")]
    DuplicateBook { book: BookId },

    #[error("Order {order_id} already exists")]
    DuplicateOrder { order_id: OrderId },

    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: String },

    /// The backing store cannot be reached at all
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Parse error{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            return LedgerError::Io {
                message: error.to_string(),
            };
        }

        let line = error.position().map(|pos| pos.line());

        LedgerError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for LedgerError {
    fn from(error: csv_async::Error) -> Self {
        LedgerError::Parse {
            line: None,
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    /// Whether the error should be surfaced for operational alerting
    ///
    /// Domain outcomes never are; only losing the store or the process I/O.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::StorageUnavailable { .. } | LedgerError::Io { .. }
        )
    }

    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::ConcurrencyConflict { .. } | LedgerError::GatewayUnavailable { .. }
        )
    }

    pub fn out_of_stock(book: BookId) -> Self {
        LedgerError::OutOfStock { book }
    }

    pub fn insufficient_funds(user: UserId, balance: u64, requested: u64) -> Self {
        LedgerError::InsufficientFunds {
            user,
            balance,
            requested,
        }
    }

    pub fn account_not_found(user: UserId) -> Self {
        LedgerError::AccountNotFound { user }
    }

    pub fn book_not_found(book: BookId) -> Self {
        LedgerError::BookNotFound { book }
    }

    pub fn invalid_book(book: BookId, reason: &str) -> Self {
        LedgerError::InvalidBook {
            book,
            reason: reason.to_string(),
        }
    }

    pub fn rental_not_found(rental: RentalId) -> Self {
        LedgerError::RentalNotFound { rental }
    }

    pub fn invalid_state(rental: RentalId, from: impl ToString, to: impl ToString) -> Self {
        LedgerError::InvalidState {
            rental,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn invalid_deposit_transition(
        order_id: &OrderId,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        LedgerError::InvalidDepositTransition {
            order_id: order_id.clone(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn unknown_order(order_id: &OrderId) -> Self {
        LedgerError::UnknownOrder {
            order_id: order_id.clone(),
        }
    }

    pub fn unknown_status(order_id: &OrderId, status: &str) -> Self {
        LedgerError::UnknownStatus {
            order_id: order_id.clone(),
            status: status.to_string(),
        }
    }

    pub fn gateway_unavailable(message: impl ToString) -> Self {
        LedgerError::GatewayUnavailable {
            message: message.to_string(),
        }
    }

    pub fn concurrency_conflict(user: UserId, expected: u64, actual: u64) -> Self {
        LedgerError::ConcurrencyConflict {
            user,
            expected,
            actual,
        }
    }

    pub fn invalid_amount(amount: u64, operation: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    pub fn duplicate_order(order_id: &OrderId) -> Self {
        LedgerError::DuplicateOrder {
            order_id: order_id.clone(),
        }
    }

    pub fn arithmetic_overflow(operation: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }
}
