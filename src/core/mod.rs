//! Core business logic module
//!
//! This module contains the deposit ledger and rental-settlement components:
//! - `traits` - Trait seams between the rental saga and its two stores
//! - `clock` - Time source (wall clock or manually driven)
//! - `inventory` - Per-title stock with atomic reserve/release
//! - `ledger` - Per-user balances with overdraft protection
//! - `deposit_store` - Top-up attempts keyed by provider order id
//! - `rental` - Rental creation saga and return transition
//! - `reconciler` - Idempotent payment webhook handling
//! - `gateway` - Payment provider boundary and sandbox implementation
//! - `top_up` - Top-up initiation with bounded gateway calls
//! - `service` - Facade wiring everything together

pub mod clock;
pub mod deposit_store;
pub mod gateway;
pub mod inventory;
pub mod ledger;
pub mod reconciler;
pub mod rental;
pub mod service;
pub mod top_up;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use deposit_store::DepositStore;
pub use gateway::{PaymentGateway, SandboxGateway, SandboxMode};
pub use inventory::Inventory;
pub use ledger::Ledger;
pub use reconciler::{ApplyOutcome, WebhookReconciler};
pub use rental::RentalLifecycle;
pub use service::RentalService;
pub use top_up::{OrderIdGenerator, TopUpService, TopUpSession};
pub use traits::{BalanceLedger, BookInventory};
