//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `ids`: identifier aliases and the order-id newtype
//! - `account`: deposit accounts
//! - `book`: per-title stock
//! - `rental`: rental records and their state machine
//! - `deposit`: top-up transactions and provider status mapping
//! - `error`: error types for the ledger

pub mod account;
pub mod book;
pub mod deposit;
pub mod error;
pub mod ids;
pub mod rental;

pub use account::Account;
pub use book::{BookStock, DEFAULT_CATEGORY};
pub use deposit::{DepositStatus, DepositTransaction, ProviderOutcome};
pub use error::LedgerError;
pub use ids::{BookId, DepositId, OrderId, RentalId, UserId};
pub use rental::{RentalRecord, RentalStatus, LOAN_PERIOD_DAYS};
