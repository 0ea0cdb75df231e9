//! Payment webhook reconciliation
//!
//! This module provides the `WebhookReconciler`, the sole writer of deposit
//! status transitions and the sole caller of the ledger's credit for top-ups.
//!
//! Callbacks are delivered at least once and possibly out of order. Each one
//! is applied while holding the deposit row's lock, so for any order id at
//! most one delivery performs the settle-and-credit and every other delivery
//! observes the terminal status and does nothing.

use crate::core::clock::Clock;
use crate::core::deposit_store::DepositStore;
use crate::core::traits::BalanceLedger;
use crate::types::{DepositStatus, LedgerError, OrderId, ProviderOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a callback did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Transaction settled and the user credited
    Settled,
    /// Transaction marked failed
    Failed,
    /// Provider still waiting; transaction left pending
    StillPending,
    /// Transaction was already terminal; nothing changed
    AlreadyFinal(DepositStatus),
}

pub struct WebhookReconciler {
    deposits: Arc<DepositStore>,
    ledger: Arc<dyn BalanceLedger>,
    clock: Arc<dyn Clock>,
}

impl WebhookReconciler {
    pub fn new(
        deposits: Arc<DepositStore>,
        ledger: Arc<dyn BalanceLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            deposits,
            ledger,
            clock,
        }
    }

    /// Apply one provider callback
    ///
    /// # Arguments
    ///
    /// * `order_id` - Order id from the callback
    /// * `provider_status` - Raw provider status, e.g. `"settlement"`
    ///
    /// # Returns
    ///
    /// * `Ok(ApplyOutcome)` - Acknowledge the callback
    /// * `Err(LedgerError::UnknownOrder)` - No such order; nothing changed
    /// * `Err(LedgerError::UnknownStatus)` - Status not understood; the
    ///   transaction stays pending
    /// * `Err(..)` from the ledger - Credit failed; the transaction stays
    ///   pending so a redelivery can settle it
    pub fn apply(
        &self,
        order_id: &OrderId,
        provider_status: &str,
    ) -> Result<ApplyOutcome, LedgerError> {
        let result = self.deposits.with_order(order_id, |tx| {
            if tx.status.is_terminal() {
                debug!(order_id = %order_id, status = %tx.status, provider_status, "Duplicate callback ignored");
                return Ok(ApplyOutcome::AlreadyFinal(tx.status));
            }

            let outcome = ProviderOutcome::classify(provider_status)
                .ok_or_else(|| LedgerError::unknown_status(order_id, provider_status))?;

            match outcome {
                ProviderOutcome::Waiting => Ok(ApplyOutcome::StillPending),
                ProviderOutcome::Failure => {
                    tx.transition_to(DepositStatus::Failed, self.clock.now())?;
                    info!(order_id = %order_id, user = tx.user, provider_status, "Deposit failed");
                    Ok(ApplyOutcome::Failed)
                }
                ProviderOutcome::Success => {
                    // Transition is checked on a copy, credited, then committed:
                    // if the credit fails the row stays pending and a
                    // redelivery retries it.
                    let mut settled = tx.clone();
                    settled.transition_to(DepositStatus::Settled, self.clock.now())?;
                    let account = self.ledger.credit(tx.user, tx.amount)?;
                    *tx = settled;
                    info!(
                        order_id = %order_id,
                        user = tx.user,
                        amount = tx.amount,
                        balance = account.balance,
                        "Deposit settled"
                    );
                    Ok(ApplyOutcome::Settled)
                }
            }
        });

        if let Err(err) = &result {
            warn!(order_id = %order_id, provider_status, error = %err, "Callback rejected");
        }
        result
    }
}
