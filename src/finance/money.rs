//! Currency amounts and rounding
//!
//! Every amount is a `rust_decimal::Decimal` in rupees. Arithmetic stays exact;
//! stored and returned amounts are rounded to paise with [`round2`].

use rust_decimal::prelude::*;

/// Places kept on stored amounts (paise)
pub const DECIMAL_PLACES: u32 = 2;

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    let rounded =
        value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() { Decimal::ZERO } else { rounded }
}

/// Sum amounts and round the result once.
pub fn sum2<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    round2(values.into_iter().sum())
}

/// `rate` percent of `amount`, unrounded
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate / Decimal::ONE_HUNDRED
}

/// Parse a decimal literal in tests
#[cfg(test)]
pub(crate) fn d(value: &str) -> Decimal {
    value.parse().expect("valid decimal literal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(d("1.005")), d("1.01"));
        assert_eq!(round2(d("2.675")), d("2.68"));
        assert_eq!(round2(d("2.674")), d("2.67"));
        assert_eq!(round2(d("10")), d("10"));
    }

    #[test]
    fn test_round2_large_amounts_stay_exact() {
        // half a paisa on an amount in crores
        assert_eq!(round2(d("34349996.745")), d("34349996.75"));
        assert_eq!(round2(d("999999999999.995")), d("1000000000000.00"));
    }

    #[test]
    fn test_round2_negative() {
        assert_eq!(round2(d("-1.005")), d("-1.01"));
    }

    #[test]
    fn test_round2_no_negative_zero() {
        assert!(round2(d("-0.001")).is_sign_positive());
    }

    #[test]
    fn test_sum2() {
        assert_eq!(sum2([d("0.1"), d("0.2"), d("0.3")]), d("0.6"));
        assert_eq!(sum2(Vec::<Decimal>::new()), Decimal::ZERO);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(d("33333"), d("12.5")), d("4166.625"));
    }
}
