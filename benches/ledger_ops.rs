//! Benchmark suite for hot ledger paths
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Covers the per-key store operations, the rental saga round trip, webhook
//! settlement, and a full replay of a generated operations file.

use chrono::{TimeZone, Utc};
use rental_ledger::cli::ReportKind;
use rental_ledger::config::LedgerConfig;
use rental_ledger::core::{
    BalanceLedger, FixedClock, Inventory, Ledger, RentalLifecycle, RentalService, SandboxGateway,
};
use rental_ledger::replay::Replayer;
use rental_ledger::types::OrderId;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

fn pinned_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ))
}

/// Credit then debit the same account
#[divan::bench]
fn ledger_credit_debit(bencher: divan::Bencher) {
    let ledger = Ledger::new();
    ledger.open_account(1, 0).unwrap();

    bencher.bench_local(|| {
        ledger.credit(1, 100).unwrap();
        ledger.debit(1, 100).unwrap();
    });
}

/// Create a rental and return it again
#[divan::bench]
fn rental_create_return(bencher: divan::Bencher) {
    let inventory = Arc::new(Inventory::new());
    let ledger = Arc::new(Ledger::new());
    inventory.add_book(1, "Dune", "Fiction", 1, 1).unwrap();
    ledger.open_account(1, u64::MAX / 2).unwrap();
    let rentals = RentalLifecycle::new(inventory, ledger, pinned_clock());

    bencher.bench_local(|| {
        let rental = rentals.create_rental(1, 1).unwrap();
        rentals.return_book(rental.id).unwrap();
    });
}

/// Open and settle one top-up per iteration
#[divan::bench]
fn webhook_settlement(bencher: divan::Bencher) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let service = RentalService::new(
        &LedgerConfig::default(),
        pinned_clock(),
        Arc::new(SandboxGateway::default()),
    );
    service.open_account(1, 0).unwrap();
    let mut n = 0u64;

    bencher.bench_local(|| {
        n += 1;
        let order_id = OrderId::new(format!("ORDER-1-{}", n));
        runtime
            .block_on(service.initiate_top_up_with_order_id(1, 100, order_id.clone()))
            .unwrap();
        service.handle_webhook(&order_id, "settlement").unwrap();
    });
}

/// Replay a generated file of rentals and returns
#[divan::bench(args = [100, 1_000])]
fn replay_rentals(bencher: divan::Bencher, users: u64) {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "type,user,book,rental,order,amount,copies,status").unwrap();
    writeln!(file, "book,,1,,,10,{},", users).unwrap();
    for user in 1..=users {
        writeln!(file, "account,{},,,,100,,", user).unwrap();
        writeln!(file, "rent,{},1,,,,,", user).unwrap();
    }
    for rental in 1..=users {
        writeln!(file, "return,,,{},,,,", rental).unwrap();
    }
    file.flush().unwrap();

    let replayer = Replayer::new(
        LedgerConfig::default().with_clock_start(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
    );

    bencher.bench_local(|| {
        let mut output = Vec::new();
        replayer
            .process(file.path(), ReportKind::Accounts, &mut output)
            .expect("Replay failed");
    });
}
