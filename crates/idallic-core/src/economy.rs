//! Coin balance and spending policy.
//!
//! Strict spending checks the balance before debiting and rejects purchases
//! it cannot cover. Legacy spending reproduces the behavior of save files
//! written by older builds, where purchases always went through and the
//! balance could go negative.

use crate::fixed::Fixed64;

/// How purchases treat an insufficient coin balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpendPolicy {
    /// Check-then-debit: a purchase either fully succeeds or changes nothing.
    #[default]
    Strict,
    /// Always debit, allowing the balance to go negative.
    Legacy,
}

/// Spending errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EconomyError {
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        required: Fixed64,
        available: Fixed64,
    },
}

/// Coin balance plus the active spending policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Economy {
    coins: Fixed64,
    policy: SpendPolicy,
}

impl Economy {
    pub fn new(policy: SpendPolicy) -> Self {
        Self {
            coins: Fixed64::from_num(0),
            policy,
        }
    }

    pub fn coins(&self) -> Fixed64 {
        self.coins
    }

    pub fn policy(&self) -> SpendPolicy {
        self.policy
    }

    pub fn credit(&mut self, amount: Fixed64) {
        self.coins += amount;
    }

    /// Debit `cost` coins under the active policy.
    pub fn spend(&mut self, cost: Fixed64) -> Result<(), EconomyError> {
        if self.policy == SpendPolicy::Strict && self.coins < cost {
            return Err(EconomyError::InsufficientFunds {
                required: cost,
                available: self.coins,
            });
        }
        self.coins -= cost;
        Ok(())
    }

    pub(crate) fn set_coins(&mut self, coins: Fixed64) {
        self.coins = coins;
    }
}

impl Default for Economy {
    fn default() -> Self {
        Self::new(SpendPolicy::Strict)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::qty;

    #[test]
    fn strict_spend_rejects_overdraft() {
        let mut e = Economy::new(SpendPolicy::Strict);
        e.credit(qty(3));

        let err = e.spend(qty(5)).unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientFunds {
                required: qty(5),
                available: qty(3),
            }
        );
        assert_eq!(e.coins(), qty(3));
    }

    #[test]
    fn strict_spend_debits_when_covered() {
        let mut e = Economy::new(SpendPolicy::Strict);
        e.credit(qty(10));
        e.spend(qty(4)).unwrap();
        assert_eq!(e.coins(), qty(6));

        // Spending the exact balance is allowed.
        e.spend(qty(6)).unwrap();
        assert_eq!(e.coins(), qty(0));
    }

    #[test]
    fn legacy_spend_goes_negative() {
        let mut e = Economy::new(SpendPolicy::Legacy);
        e.credit(qty(2));
        e.spend(qty(5)).unwrap();
        assert_eq!(e.coins(), qty(2) - qty(5));
        assert!(e.coins() < qty(0));
    }

    #[test]
    fn default_policy_is_strict() {
        assert_eq!(Economy::default().policy(), SpendPolicy::Strict);
    }
}
