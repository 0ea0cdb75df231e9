//! Identifier types shared across the ledger

use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier
pub type UserId = u64;

/// Book (title) identifier
pub type BookId = u64;

/// Rental record identifier, assigned sequentially from 1
pub type RentalId = u64;

/// Deposit transaction identifier, assigned sequentially from 1
pub type DepositId = u64;

/// Provider-issued order identifier
///
/// This is the idempotency key for payment callbacks: no two deposit
/// transactions share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap a raw order id
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw order id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for OrderId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
