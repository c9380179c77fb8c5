//! Production chain example: dirt + water -> mud -> coins -> wood.
//!
//! Demonstrates producer nodes feeding a bound consumer on their stock
//! timers, selling the output, and reinvesting the coins in a new node.
//!
//! Run with: `cargo run -p idallic-core --example production_chain`

use idallic_core::catalog::default_catalog;
use idallic_core::fixed::qty;
use idallic_core::persist::MemoryStore;
use idallic_core::sim::Simulation;
use idallic_core::world::World;

fn main() {
    let mut sim = Simulation::new(World::new(default_catalog()), Box::new(MemoryStore::new()));

    // --- Place two producers and a mud consumer ---

    let dirt_recipe = sim.world().catalog().recipe_id("dirt").unwrap();
    let water_recipe = sim.world().catalog().recipe_id("water").unwrap();
    let mud_recipe = sim.world().catalog().recipe_id("mud").unwrap();

    sim.spawn_free(dirt_recipe).unwrap();
    sim.spawn_free(water_recipe).unwrap();
    let mud_node = sim.spawn_free(mud_recipe).unwrap();

    // The mud consumer draws 2 dirt + 1 water per tick; wire both slots.
    let dirt = sim.world().catalog().resource_id("dirt").unwrap();
    let water = sim.world().catalog().resource_id("water").unwrap();
    let mud = sim.world().catalog().resource_id("mud").unwrap();
    sim.world_mut()
        .set_input_binding(mud_node, dirt, true)
        .unwrap();
    sim.world_mut()
        .set_input_binding(mud_node, water, true)
        .unwrap();

    // --- Run 10 simulated seconds ---

    println!("Running 10 simulated seconds: dirt + water -> mud\n");

    for step in 0..100u64 {
        sim.advance(100).expect("advance should succeed");

        if (step + 1) % 20 == 0 {
            let w = sim.world();
            println!(
                "=== t = {} ms ===\n  dirt: {}, water: {}, mud: {}",
                sim.now(),
                w.resource_amount(dirt),
                w.resource_amount(water),
                w.resource_amount(mud),
            );
        }
    }

    // --- Trade: sell mud, buy a wood producer ---

    let mud_price = sim
        .world()
        .catalog()
        .get_recipe(mud_recipe)
        .expect("mud recipe exists")
        .sell_cost;
    let proceeds = sim
        .world_mut()
        .sell(mud, qty(5), qty(mud_price))
        .expect("5 mud are on hand");
    println!("\nSold 5 mud for {} coins", proceeds);

    let wood_recipe = sim.world().catalog().recipe_id("wood").unwrap();
    sim.buy(wood_recipe).expect("proceeds cover a wood producer");
    println!("Bought a wood producer; coins left: {}", sim.world().coins());

    sim.advance(1000).expect("advance should succeed");
    let wood = sim.world().catalog().resource_id("wood").unwrap();
    println!("Wood after one more second: {}", sim.world().resource_amount(wood));

    // --- Event log tail ---

    let events = sim.world().events();
    println!(
        "\nLast events ({} written, {} retained):",
        events.total_written(),
        events.len()
    );
    let skip = events.len().saturating_sub(5);
    for event in events.iter().skip(skip) {
        println!("  {:?}", event);
    }
}
