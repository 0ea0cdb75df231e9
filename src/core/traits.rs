//! Core traits for the two independent stores a rental touches
//!
//! Inventory and ledger are separate aggregates with no shared transaction.
//! The rental lifecycle only sees them through these traits, which keeps the
//! saga (reserve, debit, compensate) independent of how each store locks.

use crate::types::{Account, BookId, LedgerError, UserId};

/// Per-title stock counters with atomic reserve/release
///
/// Implementations must make `reserve` a single atomic check-and-decrement:
/// two concurrent reservations of the last copy never both succeed.
pub trait BookInventory: Send + Sync {
    /// Current rental fee of a title
    fn rental_cost(&self, book: BookId) -> Result<u64, LedgerError>;

    /// Claim one copy, failing with `OutOfStock` when none is available
    fn reserve(&self, book: BookId) -> Result<(), LedgerError>;

    /// Put one copy back on the shelf
    fn release(&self, book: BookId) -> Result<(), LedgerError>;
}

/// Per-user balances with overdraft protection
///
/// Each call mutates exactly one account under that account's lock; there
/// are no cross-account transfers.
pub trait BalanceLedger: Send + Sync {
    /// Snapshot of an account
    fn account(&self, user: UserId) -> Result<Account, LedgerError>;

    /// Subtract `amount`, failing with `InsufficientFunds` and leaving the
    /// balance untouched if it would go negative
    fn debit(&self, user: UserId, amount: u64) -> Result<Account, LedgerError>;

    /// Add a positive `amount`
    fn credit(&self, user: UserId, amount: u64) -> Result<Account, LedgerError>;
}
