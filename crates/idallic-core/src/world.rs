//! The shared world: one ledger, one population, one coin balance, and every
//! placed node.
//!
//! All operations here are synchronous and single-threaded; the scheduler in
//! [`crate::sim`] decides when they run. Two kinds of entry points exist:
//!
//! - Raw operations (`increment_resource`, `create_resource`) that a UI or
//!   script layer drives directly. These move resources but record no events.
//! - Simulation operations (`node_tick`, `consume_resources_per_tick`) and
//!   player actions (`buy`, `sell`, `purchase_level_upgrade`) which append to
//!   the world's event log.

use slotmap::SlotMap;

use crate::catalog::{Catalog, Staples};
use crate::economy::{Economy, EconomyError, SpendPolicy};
use crate::event::{Event, EventLog};
use crate::fixed::{qty, Fixed64, Millis};
use crate::id::{NodeId, RecipeId, ResourceId};
use crate::ledger::{LedgerError, ResourceLedger};
use crate::node::{NodeInstance, NodeStatus, StallReason, TickOutcome};
use crate::population::{PopulationState, PopulationTickOutcome};

/// Errors from world operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("recipe {0:?} is not in the catalog")]
    RecipeNotFound(RecipeId),
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),
    #[error("node {node:?} has no input slot for resource {resource:?}")]
    UnknownInputSlot { node: NodeId, resource: ResourceId },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Economy(#[from] EconomyError),
}

/// Everything the simulation mutates.
#[derive(Debug)]
pub struct World {
    catalog: Catalog,
    ledger: ResourceLedger,
    population: PopulationState,
    economy: Economy,
    nodes: SlotMap<NodeId, NodeInstance>,
    events: EventLog,
    now: Millis,
}

impl World {
    /// A fresh world under the default strict spending policy.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_policy(catalog, SpendPolicy::Strict)
    }

    pub fn with_policy(catalog: Catalog, policy: SpendPolicy) -> Self {
        let ledger = ResourceLedger::new(catalog.resource_count());
        Self {
            catalog,
            ledger,
            population: PopulationState::new(),
            economy: Economy::new(policy),
            nodes: SlotMap::with_key(),
            events: EventLog::default(),
            now: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn resources(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Direct ledger access, e.g. for seeding scenario state.
    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn resource_amount(&self, id: ResourceId) -> Fixed64 {
        self.ledger.get(id)
    }

    pub fn population(&self) -> &PopulationState {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut PopulationState {
        &mut self.population
    }

    pub fn coins(&self) -> Fixed64 {
        self.economy.coins()
    }

    pub fn spend_policy(&self) -> SpendPolicy {
        self.economy.policy()
    }

    pub fn economy_mut(&mut self) -> &mut Economy {
        &mut self.economy
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeInstance)> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current simulation time. The driver stamps this before dispatching
    /// due timers so events carry the right timestamps.
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn set_now(&mut self, now: Millis) {
        self.now = now;
    }

    // -----------------------------------------------------------------------
    // Raw resource operations
    // -----------------------------------------------------------------------

    /// Producer tick for one node: credit its output unconditionally and
    /// return the credited amount. Population effects are never applied on
    /// this path.
    pub fn increment_resource(&mut self, id: NodeId) -> Result<Fixed64, WorldError> {
        let node = self.nodes.get(id).ok_or(WorldError::NodeNotFound(id))?;
        let def = self
            .catalog
            .get_recipe(node.recipe)
            .ok_or(WorldError::RecipeNotFound(node.recipe))?;
        let resource = def.output.resource;
        let amount = node.output_quantity(def);

        self.ledger.credit(resource, amount);
        Ok(amount)
    }

    /// Consumer transaction: debit every requirement and credit `amount` of
    /// `output`, all or nothing. Returns whether the transaction applied.
    /// On success the recipe's population effect, if any, is applied.
    pub fn create_resource(
        &mut self,
        requirements: &[(ResourceId, Fixed64)],
        amount: Fixed64,
        output: ResourceId,
        recipe: RecipeId,
    ) -> Result<bool, WorldError> {
        let def = self
            .catalog
            .get_recipe(recipe)
            .ok_or(WorldError::RecipeNotFound(recipe))?;
        let effect = def.population;

        let applied = self
            .ledger
            .try_transaction(requirements, &[(output, amount)]);
        if applied && let Some(effect) = effect {
            self.population.apply_effect(&effect);
        }
        Ok(applied)
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    /// Spend `cost` coins and place a level-1 node of `recipe`. Under strict
    /// spending an uncovered cost leaves the world untouched.
    pub fn buy(&mut self, recipe: RecipeId, cost: Fixed64) -> Result<NodeId, WorldError> {
        let def = self
            .catalog
            .get_recipe(recipe)
            .ok_or(WorldError::RecipeNotFound(recipe))?;

        self.economy.spend(cost)?;
        let id = self.nodes.insert(NodeInstance::new(recipe, def));
        self.events.push(Event::NodePlaced {
            node: id,
            recipe,
            at: self.now,
        });
        tracing::debug!(node = ?id, recipe = %def.name, %cost, "node placed");
        Ok(id)
    }

    /// Sell `amount` units at `price_per_unit`, crediting the proceeds.
    /// Strict spending refuses to sell more than the ledger holds; legacy
    /// spending debits regardless and can leave the balance negative.
    pub fn sell(
        &mut self,
        resource: ResourceId,
        amount: Fixed64,
        price_per_unit: Fixed64,
    ) -> Result<Fixed64, WorldError> {
        match self.economy.policy() {
            SpendPolicy::Strict => self.ledger.debit(resource, amount)?,
            SpendPolicy::Legacy => self.ledger.force_debit(resource, amount),
        }

        let proceeds = price_per_unit * amount;
        self.economy.credit(proceeds);
        self.events.push(Event::ResourceSold {
            resource,
            amount,
            coins: proceeds,
            at: self.now,
        });
        Ok(proceeds)
    }

    /// Buy the next level for a node. The cost is
    /// `level * production_per_tick` coins at the node's current level.
    /// Returns the new level.
    pub fn purchase_level_upgrade(&mut self, id: NodeId) -> Result<u32, WorldError> {
        let node = self.nodes.get(id).ok_or(WorldError::NodeNotFound(id))?;
        let def = self
            .catalog
            .get_recipe(node.recipe)
            .ok_or(WorldError::RecipeNotFound(node.recipe))?;
        let cost = node.upgrade_cost(def);

        self.economy.spend(cost)?;

        let node = self.nodes.get_mut(id).ok_or(WorldError::NodeNotFound(id))?;
        node.level += 1;
        let level = node.level;
        self.events.push(Event::NodeUpgraded {
            node: id,
            level,
            at: self.now,
        });
        Ok(level)
    }

    /// Wire or unwire one input slot of a node.
    pub fn set_input_binding(
        &mut self,
        id: NodeId,
        resource: ResourceId,
        bound: bool,
    ) -> Result<(), WorldError> {
        let node = self.nodes.get_mut(id).ok_or(WorldError::NodeNotFound(id))?;
        if node.set_binding(resource, bound) {
            Ok(())
        } else {
            Err(WorldError::UnknownInputSlot { node: id, resource })
        }
    }

    // -----------------------------------------------------------------------
    // Simulation ticks
    // -----------------------------------------------------------------------

    /// One firing of a node's repeating production timer.
    ///
    /// Producers credit unconditionally. Consumers first check that every
    /// input slot is bound and covered by the ledger, then apply the whole
    /// consume-produce transaction atomically; any unmet slot skips the tick
    /// without touching the ledger. Input requirements are fixed per tick,
    /// only the output scales with level.
    pub fn node_tick(&mut self, id: NodeId) -> Result<TickOutcome, WorldError> {
        let node = self.nodes.get(id).ok_or(WorldError::NodeNotFound(id))?;
        let def = self
            .catalog
            .get_recipe(node.recipe)
            .ok_or(WorldError::RecipeNotFound(node.recipe))?;

        let output = def.output.resource;
        let amount = node.output_quantity(def);
        let effect = def.population;
        let prev_status = node.status;

        // Eligibility pass over the input slots, in recipe order.
        let mut stall = None;
        let mut debits = Vec::with_capacity(def.inputs.len());
        for input in &def.inputs {
            if !node.is_bound(input.resource) {
                stall = Some(StallReason::UnboundInput(input.resource));
                break;
            }
            let required = qty(input.quantity);
            if self.ledger.get(input.resource) < required {
                stall = Some(StallReason::MissingInput(input.resource));
                break;
            }
            debits.push((input.resource, required));
        }

        let outcome = if let Some(reason) = stall {
            TickOutcome::Skipped(reason)
        } else if debits.is_empty() {
            // Producer: nothing to consume.
            self.ledger.credit(output, amount);
            TickOutcome::Produced {
                resource: output,
                amount,
            }
        } else if self.ledger.try_transaction(&debits, &[(output, amount)]) {
            if let Some(effect) = effect {
                self.population.apply_effect(&effect);
            }
            TickOutcome::Produced {
                resource: output,
                amount,
            }
        } else {
            // Unreachable with per-slot checks above and unique input slots,
            // but a recipe pack could list the same resource twice.
            TickOutcome::Skipped(StallReason::MissingInput(debits[0].0))
        };

        match outcome {
            TickOutcome::Produced { resource, amount } => {
                self.events.push(Event::ResourceProduced {
                    node: id,
                    resource,
                    amount,
                    at: self.now,
                });
                if let Some(node) = self.nodes.get_mut(id) {
                    node.status = NodeStatus::Producing;
                    node.ticks_completed += 1;
                }
            }
            TickOutcome::Skipped(reason) => {
                if prev_status != NodeStatus::Stalled(reason) {
                    self.events.push(Event::NodeStalled {
                        node: id,
                        reason,
                        at: self.now,
                    });
                }
                if let Some(node) = self.nodes.get_mut(id) {
                    node.status = NodeStatus::Stalled(reason);
                }
            }
        }
        Ok(outcome)
    }

    /// One population tick: feed everyone or starve.
    ///
    /// When both staples are covered they are debited together. Otherwise
    /// each insufficient staple is zeroed, the shortfalls are summed, and
    /// that many people are lost. A staple that was sufficient on its own is
    /// left untouched even while the other runs out.
    pub fn consume_resources_per_tick(&mut self) -> PopulationTickOutcome {
        let Staples { food, water } = self.catalog.staples();
        let required_food = self.population.required_food();
        let required_water = self.population.required_water();

        if self
            .ledger
            .try_transaction(&[(food, required_food), (water, required_water)], &[])
        {
            return PopulationTickOutcome::Consumed {
                food: required_food,
                water: required_water,
            };
        }

        let mut lost = Fixed64::from_num(0);
        for (resource, required) in [(food, required_food), (water, required_water)] {
            let available = self.ledger.get(resource);
            if available < required {
                lost += required - available;
                self.ledger.drain(resource);
            }
        }
        self.population.starve(lost);
        self.events.push(Event::Starvation { lost, at: self.now });
        tracing::warn!(%lost, remaining = %self.population.total, "population starved");
        PopulationTickOutcome::Starved { lost }
    }

    // -----------------------------------------------------------------------
    // Persistence hooks
    // -----------------------------------------------------------------------

    /// Overwrite the persisted slices with restored values. Node topology is
    /// not part of the persisted record and stays as-is.
    pub(crate) fn restore(
        &mut self,
        ledger: ResourceLedger,
        population: PopulationState,
        coins: Fixed64,
    ) {
        self.ledger = ledger;
        self.population = population;
        self.economy.set_coins(coins);
    }

    /// Reset the persisted slices to their zero-value defaults.
    pub(crate) fn reset_to_defaults(&mut self) {
        self.ledger = ResourceLedger::new(self.catalog.resource_count());
        self.population = PopulationState::new();
        self.economy.set_coins(Fixed64::from_num(0));
    }
}

// ===========================================================================
// Tests
// ===========================================================================
