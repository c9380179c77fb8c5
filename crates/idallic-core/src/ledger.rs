//! Shared resource ledger.
//!
//! One balance per resource kind, shared by every node in the world. There
//! are no per-node inventories: producers credit this ledger and consumers
//! debit it. Under the default strict policy every balance stays >= 0; the
//! only paths that can drive a balance negative are `force_debit` (legacy
//! spending) and restoring a record saved by a legacy run.

use std::collections::BTreeMap;

use crate::fixed::Fixed64;
use crate::id::ResourceId;

/// Ledger debit errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient {resource:?}: need {required}, have {available}")]
    Insufficient {
        resource: ResourceId,
        required: Fixed64,
        available: Fixed64,
    },
}

/// Per-resource balances, indexed by [`ResourceId`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLedger {
    amounts: Vec<Fixed64>,
}

impl ResourceLedger {
    /// A ledger with `resource_count` zeroed balances.
    pub fn new(resource_count: usize) -> Self {
        Self {
            amounts: vec![Fixed64::from_num(0); resource_count],
        }
    }

    pub fn resource_count(&self) -> usize {
        self.amounts.len()
    }

    /// Current balance. Resources never touched read as zero.
    pub fn get(&self, id: ResourceId) -> Fixed64 {
        self.amounts
            .get(id.0 as usize)
            .copied()
            .unwrap_or(Fixed64::from_num(0))
    }

    fn slot_mut(&mut self, id: ResourceId) -> &mut Fixed64 {
        let idx = id.0 as usize;
        if idx >= self.amounts.len() {
            self.amounts.resize(idx + 1, Fixed64::from_num(0));
        }
        &mut self.amounts[idx]
    }

    /// Add `amount` (>= 0) to a balance.
    pub fn credit(&mut self, id: ResourceId, amount: Fixed64) {
        debug_assert!(
            amount >= Fixed64::from_num(0),
            "credit amount must be non-negative"
        );
        *self.slot_mut(id) += amount;
    }

    /// Remove `amount` from a balance, failing without mutation if the
    /// balance cannot cover it.
    pub fn debit(&mut self, id: ResourceId, amount: Fixed64) -> Result<(), LedgerError> {
        let available = self.get(id);
        if available < amount {
            return Err(LedgerError::Insufficient {
                resource: id,
                required: amount,
                available,
            });
        }
        *self.slot_mut(id) -= amount;
        Ok(())
    }

    /// Apply a set of debits and credits atomically: either every debit is
    /// covered and the whole batch lands, or nothing changes and `false`
    /// comes back.
    pub fn try_transaction(
        &mut self,
        debits: &[(ResourceId, Fixed64)],
        credits: &[(ResourceId, Fixed64)],
    ) -> bool {
        // Sum duplicate debit entries first so a list like
        // [(dirt, 2), (dirt, 3)] is checked as 5 dirt, not twice as affordable.
        let mut required: BTreeMap<ResourceId, Fixed64> = BTreeMap::new();
        for &(id, amount) in debits {
            *required.entry(id).or_insert(Fixed64::from_num(0)) += amount;
        }

        for (&id, &amount) in &required {
            if self.get(id) < amount {
                return false;
            }
        }

        for (&id, &amount) in &required {
            *self.slot_mut(id) -= amount;
        }
        for &(id, amount) in credits {
            self.credit(id, amount);
        }
        true
    }

    /// Zero a balance and return what was there.
    pub fn drain(&mut self, id: ResourceId) -> Fixed64 {
        let amount = self.get(id);
        *self.slot_mut(id) = Fixed64::from_num(0);
        amount
    }

    /// Subtract unconditionally, allowing the balance to go negative. Only
    /// the legacy spending policy calls this.
    pub fn force_debit(&mut self, id: ResourceId, amount: Fixed64) {
        *self.slot_mut(id) -= amount;
    }

    /// Overwrite a balance. Used when restoring persisted state, which may
    /// legitimately carry negative legacy balances.
    pub(crate) fn set(&mut self, id: ResourceId, amount: Fixed64) {
        *self.slot_mut(id) = amount;
    }

    /// All `(id, balance)` pairs, including zeros.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, Fixed64)> + '_ {
        self.amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| (ResourceId(i as u32), amount))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
