//! Composition totals
//!
//! Meal totals are always recomputed from the live children with [`totals`].
//! Journal meals use [`totals`] when first built and [`add_child`] /
//! [`remove_child`] for single child edits afterwards.

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::CalcResult;
use super::scaling::scale;
use crate::models::{Meal, NutrientProfile};

/// Sum scaled child profiles.
///
/// The result's reference quantity is the sum of the children's quantities.
pub fn totals<'a, I>(children: I) -> NutrientProfile
where
    I: IntoIterator<Item = &'a NutrientProfile>,
{
    children
        .into_iter()
        .fold(NutrientProfile::zero(), |acc, child| acc.add(child))
}

/// Add one child to existing totals
pub fn add_child(totals: &NutrientProfile, child: &NutrientProfile) -> NutrientProfile {
    totals.add(child)
}

/// Remove one child from existing totals; exact inverse of [`add_child`]
pub fn remove_child(totals: &NutrientProfile, child: &NutrientProfile) -> NutrientProfile {
    totals.sub(child)
}

/// A meal food scaled to its quantity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustedMealFood {
    pub meal_food_id: i64,
    pub food_id: i64,
    pub name: String,
    pub quantity: Decimal,
    pub adjusted: NutrientProfile,
}

/// Display view of a meal: every food scaled, plus the recomputed totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealComposition {
    pub foods: Vec<AdjustedMealFood>,
    pub totals: NutrientProfile,
}

/// Scale every food of a meal and sum the results
pub fn compose_meal(meal: &Meal) -> CalcResult<MealComposition> {
    let foods = meal
        .foods
        .iter()
        .map(|mf| {
            Ok(AdjustedMealFood {
                meal_food_id: mf.id,
                food_id: mf.food.id,
                name: mf.food.name.clone(),
                quantity: mf.quantity,
                adjusted: scale(&mf.food.profile, mf.quantity)?,
            })
        })
        .collect::<CalcResult<Vec<_>>>()?;

    let totals = totals(foods.iter().map(|f| &f.adjusted));

    Ok(MealComposition { foods, totals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Food, MealFood, Nutrient};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn food(id: i64, name: &str, kilojoules: &str) -> Food {
        Food {
            id,
            name: name.to_string(),
            profile: NutrientProfile {
                reference_quantity: d("100"),
                kilojoules: d(kilojoules),
                ..NutrientProfile::zero()
            },
            portions: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn meal(foods: Vec<(Food, &str)>) -> Meal {
        Meal {
            id: 1,
            user_id: 1,
            name: "Lunch box".to_string(),
            foods: foods
                .into_iter()
                .enumerate()
                .map(|(i, (food, quantity))| MealFood {
                    id: i as i64 + 1,
                    meal_id: 1,
                    food,
                    quantity: d(quantity),
                })
                .collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_meal_totals_two_foods() {
        let meal = meal(vec![(food(1, "A", "10"), "100"), (food(2, "B", "1"), "10")]);
        let composition = compose_meal(&meal).unwrap();

        assert_eq!(composition.foods.len(), 2);
        assert_eq!(composition.foods[1].adjusted.kilojoules, d("0.10"));
        assert_eq!(composition.totals.reference_quantity, d("110.00"));
        assert_eq!(composition.totals.kilojoules, d("10.10"));
    }

    #[test]
    fn test_empty_meal_totals_are_zero() {
        let composition = compose_meal(&meal(Vec::new())).unwrap();
        assert!(composition.foods.is_empty());
        assert_eq!(composition.totals, NutrientProfile::zero());
    }

    #[test]
    fn test_remove_child_inverts_add_child() {
        let start = NutrientProfile {
            reference_quantity: d("250"),
            kilojoules: d("1234.56"),
            proteins: d("20.01"),
            phe: d("300.5"),
            ..NutrientProfile::zero()
        };
        let children = [
            NutrientProfile {
                reference_quantity: d("33.3"),
                kilojoules: d("0.01"),
                fat: d("7.77"),
                ..NutrientProfile::zero()
            },
            NutrientProfile {
                reference_quantity: d("1000"),
                kilojoules: d("99999.99"),
                calcium: d("0.005"),
                ..NutrientProfile::zero()
            },
        ];
        for child in &children {
            assert_eq!(remove_child(&add_child(&start, child), child), start);
        }
    }

    #[test]
    fn test_incremental_matches_full_recompute() {
        let a = NutrientProfile {
            reference_quantity: d("50"),
            kilojoules: d("120.50"),
            ..NutrientProfile::zero()
        };
        let b = NutrientProfile {
            reference_quantity: d("20"),
            kilojoules: d("3.33"),
            sugar: d("1.10"),
            ..NutrientProfile::zero()
        };
        let c = NutrientProfile {
            reference_quantity: d("5"),
            kilojoules: d("0.07"),
            ..NutrientProfile::zero()
        };

        let mut running = totals([&a, &b]);
        running = add_child(&running, &c);
        running = remove_child(&running, &a);

        let full = totals([&b, &c]);
        for nutrient in Nutrient::ALL {
            assert_eq!(running.get(nutrient), full.get(nutrient));
        }
        assert_eq!(running.reference_quantity, full.reference_quantity);
    }
}
