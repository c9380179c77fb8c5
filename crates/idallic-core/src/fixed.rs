use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// All ledger amounts, population counts, and coin balances use this type so
/// two runs fed the same timer sequence land on identical state.
pub type Fixed64 = I32F32;

/// Milliseconds of simulation time.
pub type Millis = u64;

/// Convert a catalog quantity to a ledger amount.
#[inline]
pub fn qty(v: u32) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and persistence, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked f64 to Fixed64 conversion: None on NaN, infinity, or out of range.
///
/// Snapshot records carry untrusted f64 values, so the loader must not panic
/// on them.
#[inline]
pub fn checked_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        let sum = a + b;
        assert_eq!(fixed64_to_f64(sum), 3.5);
    }

    #[test]
    fn qty_matches_from_num() {
        assert_eq!(qty(5), Fixed64::from_num(5));
        assert_eq!(qty(0), Fixed64::from_num(0));
    }

    #[test]
    fn checked_conversion_rejects_non_finite() {
        assert!(checked_f64_to_fixed64(f64::NAN).is_none());
        assert!(checked_f64_to_fixed64(f64::INFINITY).is_none());
        assert!(checked_f64_to_fixed64(f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn checked_conversion_rejects_out_of_range() {
        // I32F32 integer part is 32 bits signed.
        assert!(checked_f64_to_fixed64(1.0e12).is_none());
        assert!(checked_f64_to_fixed64(-1.0e12).is_none());
        assert_eq!(
            checked_f64_to_fixed64(42.5),
            Some(f64_to_fixed64(42.5))
        );
    }

    #[test]
    fn round_trip_preserves_small_values() {
        for v in [0.0, 1.0, 2.5, 100.25, -3.75] {
            let through = fixed64_to_f64(f64_to_fixed64(v));
            assert_eq!(through, v, "round trip changed {v}");
        }
    }
}
