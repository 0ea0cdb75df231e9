//! Service facade wiring the ledger components together
//!
//! # Architecture
//!
//! ```text
//! RentalService
//!     ├── Arc<Inventory>         (book stock)
//!     ├── Arc<Ledger>            (deposit balances)
//!     ├── Arc<DepositStore>      (top-up attempts by order id)
//!     ├── RentalLifecycle        (reserve + debit saga, returns)
//!     ├── WebhookReconciler      (idempotent settlement)
//!     ├── TopUpService           (pending record + gateway session)
//!     └── Arc<dyn Clock>
//! ```
//!
//! `RentalService` is `Send + Sync`; share it behind an `Arc` across request
//! handlers. Every component locks per key, so there is no global lock.

use crate::config::LedgerConfig;
use crate::core::clock::Clock;
use crate::core::deposit_store::DepositStore;
use crate::core::gateway::PaymentGateway;
use crate::core::inventory::Inventory;
use crate::core::ledger::Ledger;
use crate::core::reconciler::{ApplyOutcome, WebhookReconciler};
use crate::core::rental::RentalLifecycle;
use crate::core::top_up::{OrderIdGenerator, TopUpService, TopUpSession};
use crate::types::{
    Account, BookId, BookStock, DepositTransaction, LedgerError, OrderId, RentalId, RentalRecord,
    RentalStatus, UserId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct RentalService {
    inventory: Arc<Inventory>,
    ledger: Arc<Ledger>,
    deposits: Arc<DepositStore>,
    rentals: RentalLifecycle,
    reconciler: WebhookReconciler,
    top_ups: TopUpService,
    clock: Arc<dyn Clock>,
}

impl RentalService {
    pub fn new(
        config: &LedgerConfig,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let inventory = Arc::new(Inventory::new());
        let ledger = Arc::new(Ledger::new());
        let deposits = Arc::new(DepositStore::new());

        let rentals = RentalLifecycle::new(inventory.clone(), ledger.clone(), clock.clone());
        let reconciler = WebhookReconciler::new(deposits.clone(), ledger.clone(), clock.clone());
        let top_ups = TopUpService::new(
            deposits.clone(),
            ledger.clone(),
            gateway,
            OrderIdGenerator::from_clock(clock.as_ref()),
            config.gateway_timeout,
        );

        Self {
            inventory,
            ledger,
            deposits,
            rentals,
            reconciler,
            top_ups,
            clock,
        }
    }

    // Boundary operations

    pub fn create_rental(&self, user: UserId, book: BookId) -> Result<RentalRecord, LedgerError> {
        self.rentals.create_rental(user, book)
    }

    pub fn return_book(&self, rental: RentalId) -> Result<RentalRecord, LedgerError> {
        self.rentals.return_book(rental)
    }

    pub async fn initiate_top_up(
        &self,
        user: UserId,
        amount: u64,
    ) -> Result<TopUpSession, LedgerError> {
        self.top_ups.initiate(user, amount).await
    }

    pub async fn initiate_top_up_with_order_id(
        &self,
        user: UserId,
        amount: u64,
        order_id: OrderId,
    ) -> Result<TopUpSession, LedgerError> {
        self.top_ups
            .initiate_with_order_id(user, amount, order_id)
            .await
    }

    pub fn handle_webhook(
        &self,
        order_id: &OrderId,
        provider_status: &str,
    ) -> Result<ApplyOutcome, LedgerError> {
        self.reconciler.apply(order_id, provider_status)
    }

    // Catalogue and accounts

    pub fn open_account(&self, user: UserId, opening_balance: u64) -> Result<Account, LedgerError> {
        self.ledger.open_account(user, opening_balance)
    }

    pub fn add_book(
        &self,
        book: BookId,
        title: impl Into<String>,
        category: impl Into<String>,
        rental_cost: u64,
        copies: u32,
    ) -> Result<BookStock, LedgerError> {
        self.inventory
            .add_book(book, title, category, rental_cost, copies)
    }

    pub fn update_book_details(
        &self,
        book: BookId,
        title: Option<String>,
        category: Option<String>,
    ) -> Result<BookStock, LedgerError> {
        self.inventory.update_details(book, title, category)
    }

    /// Remove a title once none of its copies are out
    pub fn remove_book(&self, book: BookId) -> Result<BookStock, LedgerError> {
        self.inventory.remove_book(book)
    }

    pub fn restock(&self, book: BookId, copies: u32) -> Result<BookStock, LedgerError> {
        self.inventory.restock(book, copies)
    }

    pub fn set_rental_cost(&self, book: BookId, rental_cost: u64) -> Result<BookStock, LedgerError> {
        self.inventory.set_rental_cost(book, rental_cost)
    }

    // Queries

    pub fn account(&self, user: UserId) -> Option<Account> {
        self.ledger.get(user)
    }

    pub fn book(&self, book: BookId) -> Option<BookStock> {
        self.inventory.get(book)
    }

    pub fn rental(&self, rental: RentalId) -> Option<RentalRecord> {
        self.rentals.get(rental)
    }

    pub fn rental_status(&self, rental: RentalId) -> Result<RentalStatus, LedgerError> {
        self.rentals.status_of(rental)
    }

    pub fn rentals_for_user(&self, user: UserId) -> Vec<RentalRecord> {
        self.rentals.rentals_for_user(user)
    }

    pub fn deposit(&self, order_id: &OrderId) -> Option<DepositTransaction> {
        self.deposits.get(order_id)
    }

    pub fn deposits_for_user(&self, user: UserId) -> Vec<DepositTransaction> {
        self.deposits.for_user(user)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.ledger.all_accounts()
    }

    pub fn books(&self) -> Vec<BookStock> {
        self.inventory.all_books()
    }

    pub fn rentals(&self) -> Vec<RentalRecord> {
        self.rentals.all_rentals()
    }

    pub fn deposits(&self) -> Vec<DepositTransaction> {
        self.deposits.all_transactions()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
