//! Account-related types for the rental ledger
//!
//! This module defines the Account structure that holds a user's prepaid
//! deposit balance.

use super::ids::UserId;

/// A user's prepaid deposit account
///
/// Balances are kept in the smallest currency unit as an unsigned integer,
/// so a negative balance is unrepresentable. Every mutation bumps `version`,
/// which callers can use for optimistic compare-and-set writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The owning user
    pub user: UserId,

    /// Spendable deposit balance
    pub balance: u64,

    /// Monotonic mutation counter
    ///
    /// Starts at 0 when the account is opened and increases by exactly one
    /// on every successful debit, credit, or compare-and-set.
    pub version: u64,
}

impl Account {
    /// Create a new account with the given opening balance
    ///
    /// # Arguments
    ///
    /// * `user` - The user ID for this account
    /// * `balance` - Opening balance in the smallest currency unit
    pub fn new(user: UserId, balance: u64) -> Self {
        Account {
            user,
            balance,
            version: 0,
        }
    }
}
