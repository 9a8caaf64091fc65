//! Shared decimal helpers for revenue calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a currency amount to two places, half away from zero.
///
/// Only used for display; pipeline figures stay exact.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to the nearest integer, ties to even.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::calculations::common::round_half_even;
///
/// assert_eq!(round_half_even(dec!(2.5)), dec!(2));
/// assert_eq!(round_half_even(dec!(3.5)), dec!(4));
/// ```
pub fn round_half_even(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Converts a percentage in [0, 100] to a fraction in [0, 1].
pub fn pct_to_fraction(pct: Decimal) -> Decimal {
    pct / Decimal::ONE_HUNDRED
}

/// `part / whole * 100`, or `None` when `whole` is zero.
pub fn percentage(
    part: Decimal,
    whole: Decimal,
) -> Option<Decimal> {
    if whole.is_zero() {
        return None;
    }
    Some(part * Decimal::ONE_HUNDRED / whole)
}
