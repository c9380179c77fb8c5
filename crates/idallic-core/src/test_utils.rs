//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::default_catalog;
use crate::fixed::{qty, Fixed64};
use crate::id::{NodeId, RecipeId, ResourceId};
use crate::persist::MemoryStore;
use crate::sim::Simulation;
use crate::world::World;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// World helpers
// ===========================================================================

/// A fresh world over the stock catalog, strict spending.
pub fn stock_world() -> World {
    World::new(default_catalog())
}

pub fn rid(world: &World, name: &str) -> ResourceId {
    world
        .catalog()
        .resource_id(name)
        .unwrap_or_else(|| panic!("no resource named '{name}'"))
}

pub fn recipe(world: &World, name: &str) -> RecipeId {
    world
        .catalog()
        .recipe_id(name)
        .unwrap_or_else(|| panic!("no recipe named '{name}'"))
}

/// Place a node of `name` without charging coins.
pub fn place(world: &mut World, name: &str) -> NodeId {
    let id = recipe(world, name);
    world.buy(id, qty(0)).expect("free purchase")
}

/// Wire every input slot of a node.
pub fn bind_all(world: &mut World, node: NodeId) {
    let slots: Vec<ResourceId> = world
        .node(node)
        .expect("node exists")
        .bindings()
        .iter()
        .map(|b| b.resource)
        .collect();
    for resource in slots {
        world
            .set_input_binding(node, resource, true)
            .expect("binding known slot");
    }
}

/// Credit the ledger by resource name.
pub fn stock(world: &mut World, pairs: &[(&str, u32)]) {
    for &(name, amount) in pairs {
        let id = rid(world, name);
        world.ledger_mut().credit(id, qty(amount));
    }
}

// ===========================================================================
// Simulation builders
// ===========================================================================

/// A simulation over the stock catalog backed by an in-memory store.
pub fn memory_sim() -> Simulation {
    Simulation::new(stock_world(), Box::new(MemoryStore::new()))
}

/// Build a settlement: `producer_count` dirt and water producer pairs plus
/// `consumer_count` fully bound mud consumers, all on their stock timers.
pub fn build_settlement(producer_count: usize, consumer_count: usize) -> Simulation {
    let mut sim = memory_sim();

    let dirt = recipe(sim.world(), "dirt");
    let water = recipe(sim.world(), "water");
    let mud = recipe(sim.world(), "mud");

    for _ in 0..producer_count {
        sim.spawn_free(dirt).expect("spawn dirt");
        sim.spawn_free(water).expect("spawn water");
    }
    for _ in 0..consumer_count {
        let node = sim.spawn_free(mud).expect("spawn mud");
        bind_all(sim.world_mut(), node);
    }

    sim
}
