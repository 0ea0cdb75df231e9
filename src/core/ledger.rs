//! Thread-safe balance ledger
//!
//! This module provides the `Ledger` struct, which owns every user's deposit
//! balance and implements [`BalanceLedger`].
//!
//! # Design
//!
//! Accounts live in a `DashMap` keyed by user ID. Debit and credit run as a
//! single read-check-write under the entry's shard lock, so two debits racing
//! against a balance that only covers one of them can never both land.
//! Callers that work from a snapshot instead can use
//! [`Ledger::compare_and_set`], which rejects the write with
//! `ConcurrencyConflict` if the account's version moved in between.
//!
//! # Thread Safety
//!
//! All methods take `&self` and may be called from any number of threads.
//! Operations on different accounts proceed in parallel.

use crate::core::traits::BalanceLedger;
use crate::types::{Account, LedgerError, UserId};
use dashmap::DashMap;
use tracing::debug;

/// Per-user deposit balances
#[derive(Debug, Default)]
pub struct Ledger {
    /// Accounts by user ID
    accounts: DashMap<UserId, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Open an account with an opening balance
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The new account at version 0
    /// * `Err(LedgerError::DuplicateAccount)` - If the user already has one
    pub fn open_account(&self, user: UserId, opening_balance: u64) -> Result<Account, LedgerError> {
        let mut inserted = false;
        let account = self
            .accounts
            .entry(user)
            .or_insert_with(|| {
                inserted = true;
                Account::new(user, opening_balance)
            })
            .clone();

        if !inserted {
            return Err(LedgerError::DuplicateAccount { user });
        }

        debug!(user, opening_balance, "Account opened");
        Ok(account)
    }

    pub fn get(&self, user: UserId) -> Option<Account> {
        self.accounts.get(&user).map(|entry| entry.value().clone())
    }

    /// Optimistic single-field write
    ///
    /// Sets the balance to `new_balance` only if the account is still at
    /// `expected_version`.
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The updated account, version bumped
    /// * `Err(LedgerError::ConcurrencyConflict)` - The version moved; re-read and retry
    /// * `Err(LedgerError::AccountNotFound)` - No such account
    pub fn compare_and_set(
        &self,
        user: UserId,
        expected_version: u64,
        new_balance: u64,
    ) -> Result<Account, LedgerError> {
        self.update(user, |account| {
            if account.version != expected_version {
                return Err(LedgerError::concurrency_conflict(
                    user,
                    expected_version,
                    account.version,
                ));
            }
            account.balance = new_balance;
            Ok(())
        })
    }

    /// Snapshot of every account, sorted by user ID
    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.user);
        accounts
    }

    /// Run `f` against one account under its lock and bump the version on success
    ///
    /// If `f` fails the account is left exactly as it was; closures must
    /// therefore validate before they write.
    fn update<F>(&self, user: UserId, f: F) -> Result<Account, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<(), LedgerError>,
    {
        let mut entry = self
            .accounts
            .get_mut(&user)
            .ok_or_else(|| LedgerError::account_not_found(user))?;

        f(entry.value_mut())?;
        entry.version += 1;
        Ok(entry.clone())
    }
}

impl BalanceLedger for Ledger {
    fn account(&self, user: UserId) -> Result<Account, LedgerError> {
        self.get(user)
            .ok_or_else(|| LedgerError::account_not_found(user))
    }

    fn debit(&self, user: UserId, amount: u64) -> Result<Account, LedgerError> {
        let account = self.update(user, |account| {
            if account.balance < amount {
                return Err(LedgerError::insufficient_funds(
                    user,
                    account.balance,
                    amount,
                ));
            }
            account.balance -= amount;
            Ok(())
        })?;

        debug!(user, amount, balance = account.balance, "Account debited");
        Ok(account)
    }

    fn credit(&self, user: UserId, amount: u64) -> Result<Account, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::invalid_amount(amount, "credit"));
        }

        let account = self.update(user, |account| {
            account.balance = account
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("credit"))?;
            Ok(())
        })?;

        debug!(user, amount, balance = account.balance, "Account credited");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::thread;

    fn ledger_with(user: UserId, balance: u64) -> Ledger {
        let ledger = Ledger::new();
        ledger.open_account(user, balance).unwrap();
        ledger
    }

    #[test]
    fn test_open_account_starts_at_version_zero() {
        let ledger = Ledger::new();

        let account = ledger.open_account(1, 10000).unwrap();

        assert_eq!(account, Account::new(1, 10000));
        assert_eq!(account.version, 0);
    }

    #[test]
    fn test_open_account_rejects_duplicate() {
        let ledger = ledger_with(1, 10000);

        let result = ledger.open_account(1, 0);

        assert_eq!(result, Err(LedgerError::DuplicateAccount { user: 1 }));
        assert_eq!(ledger.get(1).unwrap().balance, 10000);
    }

    #[rstest]
    #[case::partial(10000, 4000, 6000)]
    #[case::exact(10000, 10000, 0)]
    #[case::zero_amount(10000, 0, 10000)]
    fn test_debit_success(#[case] opening: u64, #[case] amount: u64, #[case] expected: u64) {
        let ledger = ledger_with(1, opening);

        let account = ledger.debit(1, amount).unwrap();

        assert_eq!(account.balance, expected);
        assert_eq!(account.version, 1);
    }

    #[test]
    fn test_debit_insufficient_funds_leaves_balance_and_version() {
        let ledger = ledger_with(1, 4000);

        let result = ledger.debit(1, 5000);

        assert_eq!(result, Err(LedgerError::insufficient_funds(1, 4000, 5000)));
        let account = ledger.get(1).unwrap();
        assert_eq!(account.balance, 4000);
        assert_eq!(account.version, 0);
    }

    #[test]
    fn test_credit_adds_and_bumps_version() {
        let ledger = ledger_with(1, 100);

        let account = ledger.credit(1, 20000).unwrap();

        assert_eq!(account.balance, 20100);
        assert_eq!(account.version, 1);
    }

    #[rstest]
    #[case::zero(0, LedgerError::invalid_amount(0, "credit"))]
    #[case::overflow(u64::MAX, LedgerError::arithmetic_overflow("credit"))]
    fn test_credit_rejections(#[case] amount: u64, #[case] expected: LedgerError) {
        let ledger = ledger_with(1, 100);

        assert_eq!(ledger.credit(1, amount), Err(expected));
        assert_eq!(ledger.get(1).unwrap(), Account::new(1, 100));
    }

    #[test]
    fn test_missing_account() {
        let ledger = Ledger::new();

        assert_eq!(ledger.debit(7, 1), Err(LedgerError::account_not_found(7)));
        assert_eq!(ledger.credit(7, 1), Err(LedgerError::account_not_found(7)));
        assert_eq!(ledger.account(7), Err(LedgerError::account_not_found(7)));
    }

    #[test]
    fn test_compare_and_set_detects_stale_version() {
        let ledger = ledger_with(1, 1000);
        let snapshot = ledger.get(1).unwrap();

        // Someone else writes first
        ledger.credit(1, 500).unwrap();

        let result = ledger.compare_and_set(1, snapshot.version, snapshot.balance + 10);
        assert_eq!(result, Err(LedgerError::concurrency_conflict(1, 0, 1)));
        assert_eq!(ledger.get(1).unwrap().balance, 1500);

        let fresh = ledger.get(1).unwrap();
        let account = ledger
            .compare_and_set(1, fresh.version, fresh.balance + 10)
            .unwrap();
        assert_eq!(account.balance, 1510);
        assert_eq!(account.version, 2);
    }

    #[test]
    fn test_balance_never_negative_over_sequence() {
        let ledger = ledger_with(1, 50);
        let ops: [(bool, u64); 6] = [
            (false, 30),
            (false, 30),
            (true, 100),
            (false, 120),
            (false, 1),
            (true, 5),
        ];

        for (is_credit, amount) in ops {
            let before = ledger.get(1).unwrap().balance;
            let result = if is_credit {
                ledger.credit(1, amount)
            } else {
                ledger.debit(1, amount)
            };
            if result.is_err() {
                assert_eq!(ledger.get(1).unwrap().balance, before);
            }
        }

        // 50 - 30 (second 30 rejected) + 100 - 120 (1 rejected) + 5
        assert_eq!(ledger.get(1).unwrap().balance, 5);
    }

    // Concurrent access tests
    #[test]
    fn test_concurrent_debits_never_overdraw() {
        let ledger = Arc::new(ledger_with(1, 10000));
        let mut handles = vec![];

        // 10 threads each try to take 5000 from 10000
        for _ in 0..10 {
            let ledger_clone = Arc::clone(&ledger);
            handles.push(thread::spawn(move || ledger_clone.debit(1, 5000).is_ok()));
        }

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 2);
        let account = ledger.get(1).unwrap();
        assert_eq!(account.balance, 0);
        assert_eq!(account.version, 2);
    }

    #[test]
    fn test_concurrent_credits_all_land() {
        let ledger = Arc::new(ledger_with(1, 0));
        let mut handles = vec![];

        for _ in 0..100 {
            let ledger_clone = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger_clone.credit(1, 100).unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let account = ledger.get(1).unwrap();
        assert_eq!(account.balance, 10000);
        assert_eq!(account.version, 100);
    }

    #[test]
    fn test_concurrent_compare_and_set_single_winner() {
        let ledger = Arc::new(ledger_with(1, 0));
        let mut handles = vec![];

        for i in 0..10u64 {
            let ledger_clone = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger_clone.compare_and_set(1, 0, i + 1).is_ok()
            }));
        }

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(ledger.get(1).unwrap().version, 1);
    }
}
