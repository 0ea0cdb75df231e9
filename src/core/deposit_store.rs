//! Thread-safe deposit transaction storage
//!
//! This module provides the `DepositStore` struct, which records every top-up
//! attempt keyed by its provider order id.
//!
//! # Purpose
//!
//! The order id is the idempotency key for payment callbacks. The store
//! guarantees it is unique and offers [`DepositStore::with_order`], which runs
//! a closure while holding the row's lock. Webhook deliveries for the same
//! order therefore serialize: the first one to reach a terminal status wins
//! and every later one observes it.

use crate::types::{DepositId, DepositTransaction, LedgerError, OrderId, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Deposit transactions by order id
#[derive(Debug)]
pub struct DepositStore {
    by_order: DashMap<OrderId, DepositTransaction>,
    next_id: AtomicU64,
}

impl DepositStore {
    pub fn new() -> Self {
        Self {
            by_order: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Record a new `Pending` transaction
    ///
    /// # Returns
    ///
    /// * `Ok(DepositTransaction)` - The stored transaction
    /// * `Err(LedgerError::DuplicateOrder)` - The order id is already taken;
    ///   the existing transaction is untouched
    pub fn insert_pending(
        &self,
        user: UserId,
        order_id: OrderId,
        amount: u64,
    ) -> Result<DepositTransaction, LedgerError> {
        let mut inserted = false;
        let tx = self
            .by_order
            .entry(order_id.clone())
            .or_insert_with(|| {
                inserted = true;
                let id: DepositId = self.next_id.fetch_add(1, Ordering::Relaxed);
                DepositTransaction::pending(id, user, order_id.clone(), amount)
            })
            .clone();

        if !inserted {
            return Err(LedgerError::duplicate_order(&order_id));
        }

        debug!(order_id = %order_id, user, amount, "Deposit transaction recorded");
        Ok(tx)
    }

    /// Store the provider session token on a transaction
    pub fn attach_payment_ref(
        &self,
        order_id: &OrderId,
        payment_ref: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.with_order(order_id, |tx| {
            tx.payment_ref = Some(payment_ref.into());
            Ok(())
        })
    }

    pub fn get(&self, order_id: &OrderId) -> Option<DepositTransaction> {
        self.by_order.get(order_id).map(|entry| entry.value().clone())
    }

    /// Run `f` on one transaction while holding its lock
    ///
    /// Concurrent calls for the same order id run one after another. The
    /// closure must not call back into this store.
    ///
    /// # Returns
    ///
    /// * `Err(LedgerError::UnknownOrder)` - No transaction has this order id
    /// * otherwise whatever `f` returns
    pub fn with_order<F, R>(&self, order_id: &OrderId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut DepositTransaction) -> Result<R, LedgerError>,
    {
        let mut entry = self
            .by_order
            .get_mut(order_id)
            .ok_or_else(|| LedgerError::unknown_order(order_id))?;
        f(entry.value_mut())
    }

    /// Snapshot of every transaction, sorted by id
    pub fn all_transactions(&self) -> Vec<DepositTransaction> {
        let mut txs: Vec<DepositTransaction> = self
            .by_order
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        txs.sort_by_key(|tx| tx.id);
        txs
    }

    /// Transactions of one user, sorted by id
    pub fn for_user(&self, user: UserId) -> Vec<DepositTransaction> {
        let mut txs: Vec<DepositTransaction> = self
            .by_order
            .iter()
            .filter(|entry| entry.user == user)
            .map(|entry| entry.value().clone())
            .collect();
        txs.sort_by_key(|tx| tx.id);
        txs
    }
}

impl Default for DepositStore {
    fn default() -> Self {
        Self::new()
    }
}
