//! Book-Rental Deposit Ledger
//!
//! # Overview
//!
//! This library keeps users' prepaid deposit balances and the stock of
//! rentable books consistent while rentals are created and returned and
//! while top-up payments are confirmed asynchronously by a payment provider.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, BookStock, RentalRecord, DepositTransaction, errors)
//! - [`core`] - Business logic components:
//!   - [`core::inventory`] - Per-title stock with atomic reserve/release
//!   - [`core::ledger`] - Per-user balances with overdraft protection
//!   - [`core::rental`] - Rental creation saga and returns
//!   - [`core::reconciler`] - Idempotent payment webhook handling
//!   - [`core::top_up`] - Top-up initiation against a [`core::gateway::PaymentGateway`]
//!   - [`core::service`] - Facade wiring the components together
//! - [`io`] - Operations CSV parsing and report output
//! - [`replay`] - Replays an operations file through the service
//! - [`cli`], [`config`], [`logging`] - Binary plumbing
//!
//! # Guarantees
//!
//! - Balances and stock never go negative
//! - A rental either commits stock decrement, debit and record together, or
//!   leaves nothing behind
//! - Any number of deliveries of the same settlement webhook credit once

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod types;

pub use config::LedgerConfig;
pub use core::{ApplyOutcome, RentalService};
pub use replay::{ReplaySummary, Replayer};
pub use types::{
    Account, BookId, BookStock, DepositStatus, DepositTransaction, LedgerError, OrderId, RentalId,
    RentalRecord, RentalStatus, UserId,
};
