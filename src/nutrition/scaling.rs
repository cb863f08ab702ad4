//! Proportional scaling of a nutrient profile

use rust_decimal::Decimal;

use super::error::{CalcResult, CalculationError};
use super::rounding::scale_half_up;
use crate::models::NutrientProfile;

/// Scale `profile` from its reference quantity to `target_quantity`.
///
/// Each nutrient becomes `round(v * target / reference, 2, HALF_UP)` and the
/// result is expressed against `target_quantity`.
pub fn scale(profile: &NutrientProfile, target_quantity: Decimal) -> CalcResult<NutrientProfile> {
    let reference = profile.reference_quantity;
    if reference <= Decimal::ZERO {
        return Err(CalculationError::InvalidReference);
    }

    profile.try_map(target_quantity, |v| {
        scale_half_up(v, target_quantity, reference).ok_or(CalculationError::Overflow(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrient;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn food_profile() -> NutrientProfile {
        NutrientProfile {
            reference_quantity: d("100"),
            kilojoules: d("100"),
            proteins: d("10"),
            carbohydrates: d("33.33"),
            fat: d("1.07"),
            sodium: d("0.5"),
            ..NutrientProfile::zero()
        }
    }

    #[test]
    fn test_scale_to_150() {
        let scaled = scale(&food_profile(), d("150")).unwrap();
        assert_eq!(scaled.kilojoules, d("150.00"));
        assert_eq!(scaled.proteins, d("15.00"));
        assert_eq!(scaled.reference_quantity, d("150"));
    }

    #[test]
    fn test_scale_rounds_half_up() {
        // 1.07 * 50 / 100 = 0.535
        let scaled = scale(&food_profile(), d("50")).unwrap();
        assert_eq!(scaled.fat, d("0.54"));
        // 0.5 * 1 / 100 = 0.005
        let scaled = scale(&food_profile(), d("1")).unwrap();
        assert_eq!(scaled.sodium, d("0.01"));
    }

    #[test]
    fn test_scale_zero_reference_is_an_error() {
        let profile = NutrientProfile {
            reference_quantity: Decimal::ZERO,
            ..food_profile()
        };
        assert_eq!(scale(&profile, d("10")), Err(CalculationError::InvalidReference));
    }

    #[test]
    fn test_scale_out_of_range_is_an_error() {
        let profile = NutrientProfile {
            kilojoules: Decimal::MAX,
            ..food_profile()
        };
        assert_eq!(
            scale(&profile, d("1000")),
            Err(CalculationError::Overflow(Decimal::MAX))
        );
    }

    #[test]
    fn test_scale_to_zero_quantity() {
        let scaled = scale(&food_profile(), Decimal::ZERO).unwrap();
        for nutrient in Nutrient::ALL {
            assert!(scaled.get(nutrient).is_zero());
        }
    }

    #[test]
    fn test_scaling_is_linear_within_rounding() {
        let profile = food_profile();
        let quantities = ["0", "1", "7.5", "33", "99.99", "150", "250.25"];
        for q1 in quantities {
            for q2 in quantities {
                let whole = scale(&profile, d(q1) + d(q2)).unwrap();
                let parts = scale(&profile, d(q1)).unwrap().add(&scale(&profile, d(q2)).unwrap());
                for nutrient in Nutrient::ALL {
                    let diff = (whole.get(nutrient) - parts.get(nutrient)).abs();
                    assert!(diff <= d("0.01"), "{nutrient:?} {q1}+{q2}: {diff}");
                }
            }
        }
    }
}
