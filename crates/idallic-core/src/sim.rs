//! Timers and the simulation driver.
//!
//! Every node runs on its own repeating timer with the recipe's
//! `tick_duration_ms` period, alongside two world-level timers: the
//! population tick and the periodic persistence flush. [`Scheduler`] keeps
//! them in a deadline-ordered heap; [`Simulation`] owns the world plus a
//! backing store and dispatches due timers in deadline order.
//!
//! Timers never catch up: when an advance overshoots a deadline the timer
//! fires once and its next deadline is measured from the new current time,
//! not from the missed one. Ties on the same deadline fire in registration
//! order, so any interleaving a driver can produce is a deadline order the
//! world already handles.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::fixed::{qty, Fixed64, Millis};
use crate::id::{NodeId, RecipeId};
use crate::node::TickOutcome;
use crate::persist::{self, LoadOutcome, StateSaveError, StateStore};
use crate::population::PopulationTickOutcome;
use crate::world::{World, WorldError};

/// Period of the world-level population timer.
pub const POPULATION_TICK_MS: Millis = 1000;
/// Period of the periodic persistence flush.
pub const PERSIST_FLUSH_MS: Millis = 5000;

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    NodeTick(NodeId),
    PopulationTick,
    PersistFlush,
}

#[derive(Debug, Clone)]
struct TimerEntry {
    deadline: Millis,
    /// Registration order, for deterministic ties.
    seq: u64,
    period: Millis,
    task: TimerTask,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    // BinaryHeap is a max-heap; reverse the comparison so the earliest
    // deadline (then the earliest registration) pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deadline-ordered repeating timers over a millisecond clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<TimerEntry>,
    now: Millis,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn timer_count(&self) -> usize {
        self.heap.len()
    }

    /// Register a repeating timer. The first firing is `period` from now;
    /// a zero period is clamped to 1 ms.
    pub fn schedule(&mut self, task: TimerTask, period: Millis) {
        let period = period.max(1);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(TimerEntry {
            deadline: self.now + period,
            seq,
            period,
            task,
        });
    }

    /// Move the clock forward by `dt` and collect every due timer, in
    /// deadline order. Each timer fires at most once; its next deadline is
    /// `period` from the new current time.
    pub fn advance(&mut self, dt: Millis) -> Vec<TimerTask> {
        self.now += dt;
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|e| e.deadline <= self.now) {
            let Some(mut entry) = self.heap.pop() else {
                break;
            };
            due.push(entry.task);
            entry.deadline = self.now + entry.period;
            self.heap.push(entry);
        }
        due
    }

    /// Drop every timer. The clock keeps its value.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

// ---------------------------------------------------------------------------
// Simulation driver
// ---------------------------------------------------------------------------

/// Counts of what one [`Simulation::advance`] call dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvanceSummary {
    /// Node timers that fired and produced.
    pub node_ticks: u64,
    /// Node timers that fired and skipped.
    pub nodes_skipped: u64,
    pub population_ticks: u64,
    pub starvations: u64,
    pub flushes: u64,
}

/// Owns a world, its timers, and the store its state persists to.
pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    store: Box<dyn StateStore>,
}

impl Simulation {
    /// Wrap a world and schedule the two world-level timers.
    pub fn new(world: World, store: Box<dyn StateStore>) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerTask::PopulationTick, POPULATION_TICK_MS);
        scheduler.schedule(TimerTask::PersistFlush, PERSIST_FLUSH_MS);
        Self {
            world,
            scheduler,
            store,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn store(&self) -> &dyn StateStore {
        &*self.store
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    pub fn timer_count(&self) -> usize {
        self.scheduler.timer_count()
    }

    /// Restore persisted state from the store. Call before the first
    /// `advance`; a missing or unreadable record leaves a zero-state world.
    pub fn load(&mut self) -> LoadOutcome {
        persist::load_state(&mut self.world, &*self.store)
    }

    /// Buy a node at the recipe's catalog cost and start its timer.
    pub fn buy(&mut self, recipe: RecipeId) -> Result<NodeId, WorldError> {
        let def = self
            .world
            .catalog()
            .get_recipe(recipe)
            .ok_or(WorldError::RecipeNotFound(recipe))?;
        let cost = qty(def.buy_cost);
        self.place(recipe, cost)
    }

    /// Place a node without charging coins, e.g. a starter producer.
    pub fn spawn_free(&mut self, recipe: RecipeId) -> Result<NodeId, WorldError> {
        self.place(recipe, Fixed64::from_num(0))
    }

    fn place(&mut self, recipe: RecipeId, cost: Fixed64) -> Result<NodeId, WorldError> {
        let def = self
            .world
            .catalog()
            .get_recipe(recipe)
            .ok_or(WorldError::RecipeNotFound(recipe))?;
        let period = def.tick_duration_ms;

        let id = self.world.buy(recipe, cost)?;
        self.scheduler.schedule(TimerTask::NodeTick(id), period);
        Ok(id)
    }

    /// Advance simulated time by `dt` milliseconds, dispatching every due
    /// timer in deadline order.
    pub fn advance(&mut self, dt: Millis) -> Result<AdvanceSummary, WorldError> {
        let due = self.scheduler.advance(dt);
        self.world.set_now(self.scheduler.now());

        let mut summary = AdvanceSummary::default();
        for task in due {
            match task {
                TimerTask::NodeTick(id) => match self.world.node_tick(id)? {
                    TickOutcome::Produced { .. } => summary.node_ticks += 1,
                    TickOutcome::Skipped(_) => summary.nodes_skipped += 1,
                },
                TimerTask::PopulationTick => {
                    summary.population_ticks += 1;
                    if let PopulationTickOutcome::Starved { .. } =
                        self.world.consume_resources_per_tick()
                    {
                        summary.starvations += 1;
                    }
                }
                TimerTask::PersistFlush => {
                    summary.flushes += 1;
                    // A failed flush is retried at the next interval and by
                    // the shutdown save.
                    if let Err(err) = persist::save_state(&self.world, &mut *self.store) {
                        tracing::warn!(%err, "periodic state flush failed");
                    }
                }
            }
        }
        Ok(summary)
    }

    /// Write the current state to the store immediately.
    pub fn save(&mut self) -> Result<(), StateSaveError> {
        persist::save_state(&self.world, &mut *self.store)
    }

    /// Stop all timers and write a final save.
    pub fn shutdown(mut self) -> Result<(), StateSaveError> {
        self.scheduler.clear();
        tracing::debug!(at = self.scheduler.now(), "simulation shut down");
        persist::save_state(&self.world, &mut *self.store)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::persist::{DirStore, MemoryStore, STATE_KEY};

    // --- Scheduler ---

    const A: TimerTask = TimerTask::PopulationTick;
    const B: TimerTask = TimerTask::PersistFlush;

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule(A, 500);
        s.schedule(B, 300);

        assert_eq!(s.advance(1000), vec![B, A]);
        assert_eq!(s.now(), 1000);
    }

    #[test]
    fn each_timer_fires_at_most_once_per_advance() {
        let mut s = Scheduler::new();
        s.schedule(A, 100);

        // 10_000 ms covers 100 periods, but missed firings are not replayed.
        assert_eq!(s.advance(10_000), vec![A]);
        // The next deadline is measured from the new now.
        assert_eq!(s.advance(99), Vec::<TimerTask>::new());
        assert_eq!(s.advance(1), vec![A]);
    }

    #[test]
    fn small_steps_fire_on_schedule() {
        let mut s = Scheduler::new();
        s.schedule(A, 500);
        s.schedule(B, 300);

        let mut fired_a = 0;
        let mut fired_b = 0;
        for _ in 0..30 {
            for task in s.advance(100) {
                match task {
                    TimerTask::PopulationTick => fired_a += 1,
                    TimerTask::PersistFlush => fired_b += 1,
                    TimerTask::NodeTick(_) => unreachable!(),
                }
            }
        }

        // 3000 ms total: A at 500..3000 step 500, B at 300..3000 step 300.
        assert_eq!(fired_a, 6);
        assert_eq!(fired_b, 10);
    }

    #[test]
    fn equal_deadlines_fire_in_registration_order() {
        let mut s = Scheduler::new();
        s.schedule(A, 1000);
        s.schedule(B, 1000);
        assert_eq!(s.advance(1000), vec![A, B]);

        let mut s = Scheduler::new();
        s.schedule(B, 1000);
        s.schedule(A, 1000);
        assert_eq!(s.advance(1000), vec![B, A]);
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut s = Scheduler::new();
        s.schedule(A, 0);

        assert_eq!(s.advance(1), vec![A]);
        assert_eq!(s.advance(1), vec![A]);
    }

    #[test]
    fn clear_drops_all_timers() {
        let mut s = Scheduler::new();
        s.schedule(A, 100);
        s.schedule(B, 100);
        assert_eq!(s.timer_count(), 2);

        s.clear();
        assert_eq!(s.timer_count(), 0);
        assert_eq!(s.advance(1000), Vec::<TimerTask>::new());
    }

    // --- Simulation ---

    fn sim() -> Simulation {
        Simulation::new(
            World::new(default_catalog()),
            Box::new(MemoryStore::new()),
        )
    }

    fn recipe(sim: &Simulation, name: &str) -> RecipeId {
        sim.world().catalog().recipe_id(name).unwrap()
    }

    #[test]
    fn new_simulation_has_the_two_world_timers() {
        let s = sim();
        assert_eq!(s.timer_count(), 2);
        assert_eq!(s.now(), 0);
    }

    #[test]
    fn buying_a_node_starts_its_timer() {
        let mut s = sim();
        s.world_mut().economy_mut().credit(qty(10));
        let dirt_recipe = recipe(&s, "dirt");

        let node = s.buy(dirt_recipe).unwrap();
        assert_eq!(s.world().coins(), qty(5)); // buy cost 5
        assert_eq!(s.timer_count(), 3);

        // dirt ticks every 1000 ms and credits 1 per tick.
        let dirt = s.world().catalog().resource_id("dirt").unwrap();
        let summary = s.advance(1000).unwrap();
        assert_eq!(summary.node_ticks, 1);
        assert_eq!(s.world().resource_amount(dirt), qty(1));
        assert_eq!(s.world().node(node).unwrap().ticks_completed, 1);
    }

    #[test]
    fn failed_purchase_schedules_nothing() {
        let mut s = sim();
        let dirt_recipe = recipe(&s, "dirt");
        assert!(s.buy(dirt_recipe).is_err());
        assert_eq!(s.timer_count(), 2);
        assert_eq!(s.world().node_count(), 0);
    }

    #[test]
    fn spawn_free_skips_the_coin_charge() {
        let mut s = sim();
        let water_recipe = recipe(&s, "water");
        s.spawn_free(water_recipe).unwrap();
        assert_eq!(s.world().coins(), qty(0));
        assert_eq!(s.world().node_count(), 1);
    }

    #[test]
    fn advance_dispatches_and_stamps_time() {
        let mut s = sim();
        s.spawn_free(recipe(&s, "dirt")).unwrap();

        let summary = s.advance(1000).unwrap();
        assert_eq!(summary.node_ticks, 1);
        assert_eq!(summary.population_ticks, 1);
        assert_eq!(summary.flushes, 0);
        assert_eq!(s.world().now(), 1000);

        // Event timestamps carry the simulation clock.
        let newest = s.world().events().iter().last().unwrap();
        assert_eq!(newest.at(), 1000);
    }

    #[test]
    fn periodic_flush_writes_the_store() {
        let mut s = sim();
        s.spawn_free(recipe(&s, "dirt")).unwrap();

        for _ in 0..4 {
            s.advance(1000).unwrap();
        }
        assert!(s.store().get(STATE_KEY).unwrap().is_none());

        let summary = s.advance(1000).unwrap();
        assert_eq!(summary.flushes, 1);
        assert!(s.store().get(STATE_KEY).unwrap().is_some());
    }

    #[test]
    fn stalled_nodes_count_as_skipped() {
        let mut s = sim();
        s.spawn_free(recipe(&s, "mud")).unwrap();

        let summary = s.advance(2000).unwrap();
        assert_eq!(summary.node_ticks, 0);
        assert_eq!(summary.nodes_skipped, 1);
    }

    #[test]
    fn starvation_is_counted() {
        let mut s = sim();
        s.world_mut().population_mut().capacity = qty(5);
        s.world_mut().population_mut().total = qty(5);

        let summary = s.advance(1000).unwrap();
        assert_eq!(summary.population_ticks, 1);
        assert_eq!(summary.starvations, 1);
        assert_eq!(s.world().population().total, qty(0));
    }

    #[test]
    fn load_falls_back_on_corrupt_store() {
        let mut store = MemoryStore::new();
        store.put(STATE_KEY, "not json at all").unwrap();
        let mut s = Simulation::new(World::new(default_catalog()), Box::new(store));

        assert!(matches!(s.load(), LoadOutcome::Fallback(_)));
        assert_eq!(s.world().coins(), qty(0));

        // The world still simulates normally afterwards.
        s.spawn_free(recipe(&s, "dirt")).unwrap();
        s.advance(1000).unwrap();
        let dirt = s.world().catalog().resource_id("dirt").unwrap();
        assert_eq!(s.world().resource_amount(dirt), qty(1));
    }

    #[test]
    fn shutdown_writes_a_final_save() {
        let dir = tempfile::tempdir().unwrap();

        let store = DirStore::new(dir.path()).unwrap();
        let mut s = Simulation::new(World::new(default_catalog()), Box::new(store));
        s.spawn_free(recipe(&s, "dirt")).unwrap();
        // 1400 ms: one dirt tick, no flush timer yet.
        s.advance(1400).unwrap();
        s.shutdown().unwrap();

        // A new simulation over the same directory restores the balance.
        let store = DirStore::new(dir.path()).unwrap();
        let mut restored = Simulation::new(World::new(default_catalog()), Box::new(store));
        assert!(matches!(restored.load(), LoadOutcome::Restored));
        let dirt = restored.world().catalog().resource_id("dirt").unwrap();
        assert_eq!(restored.world().resource_amount(dirt), qty(1));
    }
}
