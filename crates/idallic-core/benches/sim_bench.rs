//! Criterion benchmarks for the Idallic simulation engine.
//!
//! Three benchmark groups:
//! - `settlement_advance`: 50 and 500 node settlements driven in 100 ms steps
//! - `ledger_transactions`: accepted and rejected atomic transactions
//! - `persistence`: snapshot save and restore of a settled world

use criterion::{criterion_group, criterion_main, Criterion};
use idallic_core::fixed::qty;
use idallic_core::id::ResourceId;
use idallic_core::ledger::ResourceLedger;
use idallic_core::persist::{load_state, save_state, MemoryStore};
use idallic_core::sim::Simulation;
use idallic_core::test_utils::*;

// ===========================================================================
// Settlement builders
// ===========================================================================

/// Build and settle a producer/consumer settlement.
///
/// `producer_pairs` dirt and water producers feed `consumers` bound mud
/// consumers. The warm-up advances 5 simulated seconds so every timer has
/// fired and the ledger carries working balances.
fn settled(producer_pairs: usize, consumers: usize) -> Simulation {
    let mut sim = build_settlement(producer_pairs, consumers);
    for _ in 0..50 {
        sim.advance(100).unwrap();
    }
    sim
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_settlement_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("settlement_advance");
    group.sample_size(50);

    let mut small = settled(20, 10);
    group.bench_function("50_nodes_100ms_step", |b| {
        b.iter(|| {
            small.advance(100).unwrap();
        });
    });

    let mut large = settled(200, 100);
    group.bench_function("500_nodes_100ms_step", |b| {
        b.iter(|| {
            large.advance(100).unwrap();
        });
    });

    group.finish();
}

fn bench_ledger_transactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_transactions");
    group.sample_size(50);

    let mut ledger = ResourceLedger::new(8);
    for i in 0..8 {
        ledger.credit(ResourceId(i), qty(1_000_000));
    }

    // Credits restore the debited slots, so the accepted path never drains.
    let debits = [(ResourceId(0), qty(2)), (ResourceId(1), qty(1))];
    let credits = [
        (ResourceId(0), qty(2)),
        (ResourceId(1), qty(1)),
        (ResourceId(3), qty(1)),
    ];
    group.bench_function("accepted_2_debit_3_credit", |b| {
        b.iter(|| {
            ledger.try_transaction(&debits, &credits);
        });
    });

    let overdraft = [(ResourceId(7), qty(2_000_000_000))];
    group.bench_function("rejected_overdraft", |b| {
        b.iter(|| {
            ledger.try_transaction(&overdraft, &credits);
        });
    });

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");
    group.sample_size(50);

    let sim = settled(20, 10);
    let mut store = MemoryStore::new();

    group.bench_function("save_50_node_settlement", |b| {
        b.iter(|| {
            save_state(sim.world(), &mut store).unwrap();
        });
    });

    save_state(sim.world(), &mut store).unwrap();
    let mut target = stock_world();
    group.bench_function("load_50_node_settlement", |b| {
        b.iter(|| {
            load_state(&mut target, &store);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_settlement_advance,
    bench_ledger_transactions,
    bench_persistence
);
criterion_main!(benches);
