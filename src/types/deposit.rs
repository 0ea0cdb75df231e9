//! Deposit (top-up) transaction types
//!
//! A deposit transaction is created `Pending` when a top-up session is opened
//! and is moved to exactly one terminal status by the webhook reconciler.
//! Provider status strings are classified by [`ProviderOutcome::classify`].

use super::error::LedgerError;
use super::ids::{DepositId, OrderId, UserId};
use chrono::{DateTime, Utc};
use std::fmt;

/// Deposit transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositStatus {
    /// Session opened, no confirmed callback yet
    Pending,
    /// Payment confirmed and credited; terminal
    Settled,
    /// Payment rejected, cancelled, or expired; terminal
    Failed,
}

impl DepositStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DepositStatus::Pending)
    }

    /// Transition table: only `Pending` may move, and only to a terminal status
    pub fn can_transition_to(&self, next: DepositStatus) -> bool {
        matches!(
            (self, next),
            (DepositStatus::Pending, DepositStatus::Settled)
                | (DepositStatus::Pending, DepositStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Pending => "Pending",
            DepositStatus::Settled => "Settled",
            DepositStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal meaning of a provider status string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// Funds captured; settle and credit
    Success,
    /// Payment will never complete; mark failed
    Failure,
    /// Provider is still waiting on the payer; leave pending
    Waiting,
}

impl ProviderOutcome {
    /// Classify a raw provider status
    ///
    /// Matching ignores case and surrounding whitespace. Returns `None` for
    /// statuses the reconciler does not understand.
    pub fn classify(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "settlement" | "capture" => Some(ProviderOutcome::Success),
            "deny" | "cancel" | "expire" | "failure" => Some(ProviderOutcome::Failure),
            "pending" => Some(ProviderOutcome::Waiting),
            _ => None,
        }
    }
}

/// A top-up attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTransaction {
    pub id: DepositId,
    pub user: UserId,

    /// Idempotency key shared with the payment provider
    pub order_id: OrderId,

    /// Provider session token, known once the session was opened
    pub payment_ref: Option<String>,

    /// Amount to credit on settlement
    pub amount: u64,

    pub status: DepositStatus,

    /// Set exactly once, when the transaction settles
    pub paid_at: Option<DateTime<Utc>>,
}

impl DepositTransaction {
    pub fn pending(id: DepositId, user: UserId, order_id: OrderId, amount: u64) -> Self {
        DepositTransaction {
            id,
            user,
            order_id,
            payment_ref: None,
            amount,
            status: DepositStatus::Pending,
            paid_at: None,
        }
    }

    /// Move to `next` if the transition table allows it
    ///
    /// Settling stamps `paid_at` with `at`. A rejected transition leaves the
    /// transaction untouched.
    pub fn transition_to(
        &mut self,
        next: DepositStatus,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(next) {
            return Err(LedgerError::invalid_deposit_transition(
                &self.order_id,
                self.status,
                next,
            ));
        }

        self.status = next;
        if next == DepositStatus::Settled {
            self.paid_at = Some(at);
        }
        Ok(())
    }
}
