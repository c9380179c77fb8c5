//! Population state and the starvation rule.
//!
//! The population is a world-level aggregate, not a set of entities. Every
//! population tick it needs `total * food_per_tick` food and
//! `total * water_per_tick` water from the shared ledger. When either staple
//! falls short the shortfalls are summed and that many people are lost; only
//! the insufficient staples are zeroed out, a covered one is left untouched.

use crate::catalog::PopulationEffect;
use crate::fixed::Fixed64;

/// World-level population aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationState {
    pub total: Fixed64,
    pub capacity: Fixed64,
    /// Food consumed per person per population tick.
    pub food_per_tick: Fixed64,
    /// Water consumed per person per population tick.
    pub water_per_tick: Fixed64,
}

impl PopulationState {
    /// Zero people, zero housing, one unit of each staple per person.
    pub fn new() -> Self {
        Self {
            total: Fixed64::from_num(0),
            capacity: Fixed64::from_num(0),
            food_per_tick: Fixed64::from_num(1),
            water_per_tick: Fixed64::from_num(1),
        }
    }

    pub fn required_food(&self) -> Fixed64 {
        self.total * self.food_per_tick
    }

    pub fn required_water(&self) -> Fixed64 {
        self.total * self.water_per_tick
    }

    /// Apply a recipe's population effect: growth raises the total, capacity
    /// raises the housing limit. Growth never pushes the total past the
    /// capacity that results from this same effect.
    pub fn apply_effect(&mut self, effect: &PopulationEffect) {
        if let Some(capacity) = effect.capacity {
            self.capacity += Fixed64::from_num(capacity);
        }
        if let Some(growth) = effect.growth {
            self.total += Fixed64::from_num(growth);
        }
        if self.total > self.capacity {
            self.total = self.capacity;
        }
    }

    /// Remove `lost` people, clamped at zero.
    pub fn starve(&mut self, lost: Fixed64) {
        self.total = (self.total - lost).max(Fixed64::from_num(0));
    }
}

impl Default for PopulationState {
    fn default() -> Self {
        Self::new()
    }
}

/// What one population tick did to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationTickOutcome {
    /// Both staples were covered and debited.
    Consumed { food: Fixed64, water: Fixed64 },
    /// At least one staple fell short; `lost` people starved.
    Starved { lost: Fixed64 },
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::qty;

    #[test]
    fn new_state_is_empty_with_unit_rates() {
        let p = PopulationState::new();
        assert_eq!(p.total, qty(0));
        assert_eq!(p.capacity, qty(0));
        assert_eq!(p.food_per_tick, qty(1));
        assert_eq!(p.water_per_tick, qty(1));
    }

    #[test]
    fn requirements_scale_with_total_and_rates() {
        let mut p = PopulationState::new();
        p.total = qty(10);
        assert_eq!(p.required_food(), qty(10));
        assert_eq!(p.required_water(), qty(10));

        p.food_per_tick = Fixed64::from_num(0.5);
        p.water_per_tick = qty(2);
        assert_eq!(p.required_food(), qty(5));
        assert_eq!(p.required_water(), qty(20));
    }

    #[test]
    fn growth_clamps_to_capacity() {
        let mut p = PopulationState::new();
        p.capacity = qty(3);
        p.apply_effect(&PopulationEffect {
            growth: Some(5),
            capacity: None,
        });
        assert_eq!(p.total, qty(3));
    }

    #[test]
    fn growth_without_housing_stays_zero() {
        let mut p = PopulationState::new();
        p.apply_effect(&PopulationEffect {
            growth: Some(2),
            capacity: None,
        });
        assert_eq!(p.total, qty(0));
    }

    #[test]
    fn capacity_is_never_clamped() {
        let mut p = PopulationState::new();
        for _ in 0..4 {
            p.apply_effect(&PopulationEffect {
                growth: None,
                capacity: Some(5),
            });
        }
        assert_eq!(p.capacity, qty(20));
        assert_eq!(p.total, qty(0));
    }

    #[test]
    fn combined_effect_clamps_against_the_updated_capacity() {
        // Capacity lands before growth is clamped, so a recipe granting both
        // in a single effect gets the benefit of its own housing.
        let mut p = PopulationState::new();
        p.apply_effect(&PopulationEffect {
            growth: Some(4),
            capacity: Some(3),
        });
        assert_eq!(p.capacity, qty(3));
        assert_eq!(p.total, qty(3));
    }

    #[test]
    fn starve_clamps_at_zero() {
        let mut p = PopulationState::new();
        p.capacity = qty(10);
        p.total = qty(4);

        p.starve(qty(3));
        assert_eq!(p.total, qty(1));

        p.starve(qty(5));
        assert_eq!(p.total, qty(0));
    }
}
