//! Decimal rounding helpers
//!
//! Every arithmetic step rounds eagerly to two places, HALF_UP.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept after every step
pub const SCALE: u32 = 2;

/// The per-100 basis used by rebasing
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round to 2 decimal places, ties away from zero
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `numerator / denominator` rounded HALF_UP, or `None` for a zero denominator
pub fn divide_half_up(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.checked_div(denominator).map(round_half_up)
}

/// `value * factor / divisor` rounded HALF_UP, or `None` when it leaves the
/// decimal range or `divisor` is zero
pub fn scale_half_up(value: Decimal, factor: Decimal, divisor: Decimal) -> Option<Decimal> {
    value
        .checked_mul(factor)
        .and_then(|product| product.checked_div(divisor))
        .map(round_half_up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(d("0.005")), d("0.01"));
        assert_eq!(round_half_up(d("0.004")), d("0.00"));
        assert_eq!(round_half_up(d("2.675")), d("2.68"));
        assert_eq!(round_half_up(d("-0.005")), d("-0.01"));
    }

    #[test]
    fn test_divide_half_up() {
        assert_eq!(divide_half_up(d("10"), d("3")), Some(d("3.33")));
        assert_eq!(divide_half_up(d("20"), d("3")), Some(d("6.67")));
        assert_eq!(divide_half_up(d("1"), Decimal::ZERO), None);
    }

    #[test]
    fn test_scale_half_up() {
        assert_eq!(scale_half_up(d("1.07"), d("50"), HUNDRED), Some(d("0.54")));
        assert_eq!(scale_half_up(Decimal::MAX, d("2"), HUNDRED), None);
        assert_eq!(scale_half_up(d("1"), d("2"), Decimal::ZERO), None);
    }
}
