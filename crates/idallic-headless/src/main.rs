//! Headless Idallic settlement runner.
//!
//! Drives the engine without a UI: places starter nodes, advances simulated
//! time in fixed steps, and reports the economy as it evolves. State persists
//! to a directory store when `--state-dir` is given, so consecutive runs
//! continue the same settlement.
//!
//! # Usage
//!
//! ```bash
//! # Run 60 simulated seconds with the stock catalog
//! cargo run -p idallic-headless -- run
//!
//! # Continue a persistent settlement, pacing against the wall clock
//! cargo run -p idallic-headless -- run --state-dir save/ --real-time
//!
//! # Start a mud works from a custom recipe pack
//! cargo run -p idallic-headless -- run --data-pack packs/desert.json --place mud
//!
//! # Print the active catalog
//! cargo run -p idallic-headless -- catalog
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idallic_core::catalog::{default_catalog, Catalog};
use idallic_core::data_loader::load_catalog;
use idallic_core::economy::SpendPolicy;
use idallic_core::fixed::qty;
use idallic_core::id::NodeId;
use idallic_core::persist::{DirStore, LoadOutcome, MemoryStore, StateStore};
use idallic_core::sim::Simulation;
use idallic_core::world::World;

#[derive(Parser)]
#[command(name = "idallic-headless")]
#[command(about = "Headless Idallic settlement runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a settlement for a stretch of simulated time
    Run {
        /// Simulated seconds to run
        #[arg(short, long, default_value = "60")]
        duration_secs: u64,

        /// Simulated milliseconds per engine step
        #[arg(long, default_value = "100")]
        step_ms: u64,

        /// Pace steps against the wall clock instead of running flat out
        #[arg(long)]
        real_time: bool,

        /// Directory for the persistent state record (in-memory if omitted)
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Recipe pack JSON overriding the stock catalog
        #[arg(long)]
        data_pack: Option<PathBuf>,

        /// Let spending drive balances negative (pre-strict behavior)
        #[arg(long)]
        legacy_spending: bool,

        /// Recipe to place at start with its inputs wired; repeatable
        #[arg(long = "place", default_values = ["dirt", "water"])]
        place: Vec<String>,
    },

    /// Print the active recipe catalog
    Catalog {
        /// Recipe pack JSON overriding the stock catalog
        #[arg(long)]
        data_pack: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout is for command output.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            duration_secs,
            step_ms,
            real_time,
            state_dir,
            data_pack,
            legacy_spending,
            place,
        } => {
            cmd_run(
                duration_secs,
                step_ms,
                real_time,
                state_dir,
                data_pack,
                legacy_spending,
                place,
            );
        }
        Commands::Catalog { data_pack } => {
            cmd_catalog(data_pack);
        }
    }
}

/// Run a settlement for `duration_secs` of simulated time.
fn cmd_run(
    duration_secs: u64,
    step_ms: u64,
    real_time: bool,
    state_dir: Option<PathBuf>,
    data_pack: Option<PathBuf>,
    legacy_spending: bool,
    place: Vec<String>,
) {
    let catalog = load_catalog_or_exit(data_pack.as_deref());
    let policy = if legacy_spending {
        SpendPolicy::Legacy
    } else {
        SpendPolicy::Strict
    };

    let store: Box<dyn StateStore> = match &state_dir {
        Some(dir) => match DirStore::new(dir) {
            Ok(store) => Box::new(store),
            Err(e) => {
                eprintln!("FATAL: cannot open state dir '{}': {}", dir.display(), e);
                std::process::exit(1);
            }
        },
        None => Box::new(MemoryStore::new()),
    };

    let mut sim = Simulation::new(World::with_policy(catalog, policy), store);

    match sim.load() {
        LoadOutcome::Restored => tracing::info!("saved state restored"),
        LoadOutcome::Fresh => tracing::info!("no saved state, starting fresh"),
        LoadOutcome::Fallback(err) => {
            tracing::warn!(%err, "saved state unusable, starting over")
        }
    }

    for name in &place {
        let Some(recipe) = sim.world().catalog().recipe_id(name) else {
            eprintln!("FATAL: no recipe named '{}'", name);
            std::process::exit(1);
        };
        match sim.spawn_free(recipe) {
            Ok(node) => {
                bind_inputs(sim.world_mut(), node);
                tracing::info!(recipe = %name, "placed starter node");
            }
            Err(e) => {
                eprintln!("FATAL: cannot place '{}': {}", name, e);
                std::process::exit(1);
            }
        }
    }

    let step = step_ms.max(1);
    let total_ms = duration_secs * 1000;
    let mut elapsed = 0u64;
    let mut reported = 0u64;
    let mut node_ticks = 0u64;
    let mut nodes_skipped = 0u64;
    let mut starvations = 0u64;
    let mut flushes = 0u64;

    while elapsed < total_ms {
        let dt = step.min(total_ms - elapsed);
        match sim.advance(dt) {
            Ok(summary) => {
                node_ticks += summary.node_ticks;
                nodes_skipped += summary.nodes_skipped;
                starvations += summary.starvations;
                flushes += summary.flushes;
            }
            Err(e) => {
                eprintln!("FATAL: simulation error at t={} ms: {}", sim.now(), e);
                std::process::exit(1);
            }
        }
        elapsed += dt;

        if real_time {
            std::thread::sleep(std::time::Duration::from_millis(dt));
        }

        // Progress roughly every 10 simulated seconds.
        if elapsed / 10_000 > reported {
            reported = elapsed / 10_000;
            let w = sim.world();
            tracing::info!(
                t_ms = elapsed,
                coins = %w.coins(),
                population = %w.population().total,
                balances = %format_balances(w),
                "progress"
            );
        }
    }

    let w = sim.world();
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("RUN COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Simulated time: {}s", total_ms / 1000);
    eprintln!("Node ticks: {} fired, {} skipped", node_ticks, nodes_skipped);
    eprintln!("Starvation events: {}", starvations);
    eprintln!("State flushes: {}", flushes);
    eprintln!(
        "Population: {} of {} capacity",
        w.population().total,
        w.population().capacity
    );
    eprintln!("Coins: {}", w.coins());
    eprintln!("Balances: {}", format_balances(w));

    if let Err(e) = sim.shutdown() {
        eprintln!("FATAL: final save failed: {}", e);
        std::process::exit(1);
    }
}

/// Print the catalog as one line per recipe.
fn cmd_catalog(data_pack: Option<PathBuf>) {
    let catalog = load_catalog_or_exit(data_pack.as_deref());

    println!(
        "{} resources, {} recipes\n",
        catalog.resource_count(),
        catalog.recipe_count()
    );

    for (_, def) in catalog.recipes() {
        let name = |id| catalog.resource_name(id).unwrap_or("?");

        let inputs = if def.inputs.is_empty() {
            "-".to_string()
        } else {
            def.inputs
                .iter()
                .map(|input| format!("{} x{}", name(input.resource), input.quantity))
                .collect::<Vec<_>>()
                .join(" + ")
        };

        let mut line = format!(
            "{}: {} -> {} x{}, rate {}/tick, every {} ms, buy {}, sell {}",
            def.name,
            inputs,
            name(def.output.resource),
            def.output.amount,
            def.production_per_tick,
            def.tick_duration_ms,
            def.buy_cost,
            def.sell_cost,
        );
        if let Some(effect) = &def.population {
            if let Some(growth) = effect.growth {
                line.push_str(&format!(" [+{} people]", growth));
            }
            if let Some(capacity) = effect.capacity {
                line.push_str(&format!(" [+{} capacity]", capacity));
            }
        }
        println!("{}", line);
    }
}

/// Load a recipe pack if given, else the stock catalog.
fn load_catalog_or_exit(data_pack: Option<&Path>) -> Catalog {
    let Some(path) = data_pack else {
        return default_catalog();
    };
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("FATAL: cannot read '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    };
    match load_catalog(&json) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("FATAL: bad recipe pack '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Wire every input slot of a freshly placed node.
fn bind_inputs(world: &mut World, node: NodeId) {
    let Some(instance) = world.node(node) else {
        return;
    };
    let slots: Vec<_> = instance.bindings().iter().map(|b| b.resource).collect();
    for resource in slots {
        if let Err(e) = world.set_input_binding(node, resource, true) {
            tracing::warn!(%e, "input binding failed");
        }
    }
}

/// Nonzero balances as `name=amount` pairs.
fn format_balances(world: &World) -> String {
    let mut parts = Vec::new();
    for (id, amount) in world.resources().iter() {
        if amount != qty(0)
            && let Some(name) = world.catalog().resource_name(id)
        {
            parts.push(format!("{}={}", name, amount));
        }
    }
    if parts.is_empty() {
        "(empty)".to_string()
    } else {
        parts.join(", ")
    }
}
