//! Placed node instances.
//!
//! A node is one placed copy of a recipe: it carries its level, the bound or
//! unbound state of each input slot, and bookkeeping about what its timer
//! did last. All actual resource movement happens against the world's shared
//! ledger; nodes hold no inventory of their own.

use crate::catalog::RecipeDef;
use crate::fixed::Fixed64;
use crate::id::{RecipeId, ResourceId};

/// Why a consumer skipped a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallReason {
    /// The input slot has no supplier wired in.
    UnboundInput(ResourceId),
    /// The shared ledger cannot cover the slot's requirement.
    MissingInput(ResourceId),
}

/// What a node's timer did most recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    /// Timer has not fired yet.
    #[default]
    Idle,
    Producing,
    Stalled(StallReason),
}

/// Connection state of one input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBinding {
    pub resource: ResourceId,
    pub bound: bool,
}

/// The outcome of one production timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Produced { resource: ResourceId, amount: Fixed64 },
    Skipped(StallReason),
}

/// One placed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInstance {
    pub recipe: RecipeId,
    /// Upgrade level, starting at 1. Scales output linearly.
    pub level: u32,
    bindings: Vec<InputBinding>,
    pub status: NodeStatus,
    /// Successful (producing) ticks since placement.
    pub ticks_completed: u64,
}

impl NodeInstance {
    /// A fresh level-1 node with every input slot unbound.
    pub fn new(recipe: RecipeId, def: &RecipeDef) -> Self {
        Self {
            recipe,
            level: 1,
            bindings: def
                .inputs
                .iter()
                .map(|input| InputBinding {
                    resource: input.resource,
                    bound: false,
                })
                .collect(),
            status: NodeStatus::Idle,
            ticks_completed: 0,
        }
    }

    pub fn bindings(&self) -> &[InputBinding] {
        &self.bindings
    }

    pub fn is_bound(&self, resource: ResourceId) -> bool {
        self.bindings
            .iter()
            .any(|b| b.resource == resource && b.bound)
    }

    /// Flip one input slot. Returns false when the recipe has no slot for
    /// `resource`.
    pub fn set_binding(&mut self, resource: ResourceId, bound: bool) -> bool {
        match self.bindings.iter_mut().find(|b| b.resource == resource) {
            Some(binding) => {
                binding.bound = bound;
                true
            }
            None => false,
        }
    }

    /// Units credited per successful tick:
    /// `output.amount * production_per_tick * level`.
    pub fn output_quantity(&self, def: &RecipeDef) -> Fixed64 {
        let units =
            def.output.amount as u64 * def.production_per_tick as u64 * self.level as u64;
        Fixed64::from_num(units)
    }

    /// Coin cost of the next level: `level * production_per_tick`.
    pub fn upgrade_cost(&self, def: &RecipeDef) -> Fixed64 {
        Fixed64::from_num(self.level as u64 * def.production_per_tick as u64)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
