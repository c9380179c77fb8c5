//! Idallic Core: a deterministic resource-economy engine for incremental
//! settlement games.
//!
//! The engine models a single shared [`world::World`]: one resource ledger,
//! one population, one coin balance, and a set of placed nodes. Each node is
//! an instance of a [`catalog::RecipeDef`] and runs on its own repeating
//! timer. Producers credit the ledger unconditionally; consumers debit their
//! inputs and credit their output in one atomic transaction, skipping the
//! tick when an input is unbound or uncovered. A world-level population
//! timer consumes food and water every second and starves the population
//! when either runs short.
//!
//! Time is fully externalized: the [`sim::Scheduler`] orders repeating
//! timers on a millisecond clock, and [`sim::Simulation::advance`] dispatches
//! whatever is due. Nothing here blocks, sleeps, or reads wall clocks, so a
//! headless driver can run faster than real time and tests can replay exact
//! timer interleavings.
//!
//! All quantities are Q32.32 fixed-point ([`fixed::Fixed64`]); identical
//! inputs produce identical state on every platform. Economic state
//! persists as a small JSON record through [`persist`], with load failures
//! degrading to a fresh zero state rather than an error.

pub mod catalog;
pub mod data_loader;
pub mod economy;
pub mod event;
pub mod fixed;
pub mod id;
pub mod ledger;
pub mod node;
pub mod persist;
pub mod population;
pub mod sim;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
