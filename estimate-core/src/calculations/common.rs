//! Shared arithmetic helpers for the cost calculations.
//!
//! Money is rounded half-up to cents only at the tax step; quantities are
//! rounded up to whole purchasing units.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 round away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds up to the next whole number. Whole numbers are returned unchanged.
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::calculations::common::round_up_whole;
///
/// assert_eq!(round_up_whole(dec!(1485.0)), dec!(1485));
/// assert_eq!(round_up_whole(dec!(67.5)), dec!(68));
/// ```
pub fn round_up_whole(value: Decimal) -> Decimal {
    value.ceil().normalize()
}

/// Restricts a waste percentage to the 0–100 range.
pub fn clamp_percent(percent: Decimal) -> Decimal {
    percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// `1 + percent / 100`, with the percentage clamped first.
pub fn waste_multiplier(percent: Decimal) -> Decimal {
    Decimal::ONE + clamp_percent(percent) / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(129.995)), dec!(130.00));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-0.125)), dec!(-0.13));
    }

    // =========================================================================
    // round_up_whole tests
    // =========================================================================

    #[test]
    fn round_up_whole_keeps_integers() {
        assert_eq!(round_up_whole(dec!(550)), dec!(550));
        assert_eq!(round_up_whole(dec!(550.000)), dec!(550));
    }

    #[test]
    fn round_up_whole_rounds_any_fraction_up() {
        assert_eq!(round_up_whole(dec!(17.0001)), dec!(18));
        assert_eq!(round_up_whole(dec!(0.2)), dec!(1));
    }

    // =========================================================================
    // waste percentage tests
    // =========================================================================

    #[test]
    fn waste_multiplier_for_default_buffer() {
        assert_eq!(waste_multiplier(dec!(10)), dec!(1.10));
    }

    #[test]
    fn waste_multiplier_clamps_out_of_range_values() {
        assert_eq!(waste_multiplier(dec!(-5)), dec!(1));
        assert_eq!(waste_multiplier(dec!(250)), dec!(2));
    }

    #[test]
    fn clamp_percent_passes_values_in_range() {
        assert_eq!(clamp_percent(dec!(12.5)), dec!(12.5));
    }
}
