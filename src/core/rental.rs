//! Rental lifecycle orchestration
//!
//! This module provides the `RentalLifecycle` struct, the sole writer of
//! rental records and the sole caller of the inventory and ledger mutators
//! during rental creation.
//!
//! # Saga
//!
//! Inventory and ledger are independent stores, so creating a rental is not
//! one transaction. It is a forward sequence with one compensating action:
//!
//! ```text
//! rental_cost(book) ──► reserve(book) ──► debit(user, cost) ──► insert record
//!                           │                   │
//!                      OutOfStock          any failure
//!                      (no effect)             │
//!                                              ▼
//!                                        release(book)
//! ```
//!
//! The reservation comes first because releasing a copy is always well
//! defined, whereas refunding a debit would be a second ledger mutation that
//! could itself fail. A crash between the debit failure and the release
//! leaves one copy held; there is no reconciliation sweep for that yet.

use crate::core::clock::Clock;
use crate::core::traits::{BalanceLedger, BookInventory};
use crate::types::{BookId, LedgerError, RentalId, RentalRecord, RentalStatus, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Creates and settles rentals
pub struct RentalLifecycle {
    inventory: Arc<dyn BookInventory>,
    ledger: Arc<dyn BalanceLedger>,
    clock: Arc<dyn Clock>,
    rentals: DashMap<RentalId, RentalRecord>,
    next_id: AtomicU64,
}

impl RentalLifecycle {
    pub fn new(
        inventory: Arc<dyn BookInventory>,
        ledger: Arc<dyn BalanceLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inventory,
            ledger,
            clock,
            rentals: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Rent one copy of `book` to `user`
    ///
    /// # Returns
    ///
    /// * `Ok(RentalRecord)` - Committed rental: stock decremented, fee debited
    /// * `Err(LedgerError::BookNotFound)` - Unknown book, nothing changed
    /// * `Err(LedgerError::OutOfStock)` - No copy available, nothing changed
    /// * `Err(LedgerError::InsufficientFunds | AccountNotFound)` - Debit
    ///   failed; the reservation was released, nothing changed
    /// * `Err(LedgerError::ArithmeticOverflow)` - The due date cannot be
    ///   represented, nothing changed
    pub fn create_rental(&self, user: UserId, book: BookId) -> Result<RentalRecord, LedgerError> {
        let cost = self.inventory.rental_cost(book)?;

        // Dated before any side effect; the id is assigned once committed
        let mut record = RentalRecord::borrowed(0, book, user, cost, self.clock.now())?;

        self.inventory.reserve(book)?;

        if let Err(err) = self.ledger.debit(user, cost) {
            self.compensate(user, book, &err);
            return Err(err);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        record.id = id;
        self.rentals.insert(id, record.clone());

        info!(rental = id, user, book, cost, "Rental created");
        Ok(record)
    }

    /// Return a borrowed book
    ///
    /// Only a `Borrowed` rental (including one that currently reads as
    /// overdue) can be returned. The fee is not refunded.
    ///
    /// # Returns
    ///
    /// * `Ok(RentalRecord)` - The rental, now `Returned` with `return_date = now`
    /// * `Err(LedgerError::RentalNotFound)` - Unknown rental
    /// * `Err(LedgerError::InvalidState)` - The rental was already returned
    pub fn return_book(&self, rental: RentalId) -> Result<RentalRecord, LedgerError> {
        let mut entry = self
            .rentals
            .get_mut(&rental)
            .ok_or_else(|| LedgerError::rental_not_found(rental))?;
        let record = entry.value_mut();

        if !record.status.can_transition_to(RentalStatus::Returned) {
            warn!(rental, status = %record.status, "Return rejected");
            return Err(LedgerError::invalid_state(
                rental,
                record.status,
                RentalStatus::Returned,
            ));
        }

        // The record lock is held across the release so a second return of
        // the same rental cannot release the copy twice.
        self.inventory.release(record.book)?;
        record.status = RentalStatus::Returned;
        record.return_date = Some(self.clock.now());

        info!(rental, user = record.user, book = record.book, "Book returned");
        Ok(record.clone())
    }

    pub fn get(&self, rental: RentalId) -> Option<RentalRecord> {
        self.rentals.get(&rental).map(|entry| entry.value().clone())
    }

    /// Status of a rental as reported right now (derives `Overdue`)
    pub fn status_of(&self, rental: RentalId) -> Result<RentalStatus, LedgerError> {
        let now = self.clock.now();
        self.rentals
            .get(&rental)
            .map(|entry| entry.status_at(now))
            .ok_or_else(|| LedgerError::rental_not_found(rental))
    }

    /// Rental history of one user, oldest first
    pub fn rentals_for_user(&self, user: UserId) -> Vec<RentalRecord> {
        let mut rentals: Vec<RentalRecord> = self
            .rentals
            .iter()
            .filter(|entry| entry.user == user)
            .map(|entry| entry.value().clone())
            .collect();
        rentals.sort_by_key(|record| record.id);
        rentals
    }

    /// Snapshot of every rental, sorted by id
    pub fn all_rentals(&self) -> Vec<RentalRecord> {
        let mut rentals: Vec<RentalRecord> = self
            .rentals
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rentals.sort_by_key(|record| record.id);
        rentals
    }

    fn compensate(&self, user: UserId, book: BookId, cause: &LedgerError) {
        match self.inventory.release(book) {
            Ok(()) => warn!(user, book, cause = %cause, "Rental aborted, reservation released"),
            Err(release_err) => error!(
                user,
                book,
                cause = %cause,
                error = %release_err,
                "Compensation failed, copy still reserved"
            ),
        }
    }
}
