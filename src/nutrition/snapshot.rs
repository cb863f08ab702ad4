//! Journal snapshots
//!
//! Logging a food or meal copies its scaled values, name and portions so that
//! journal history survives later edits to the source.

use rust_decimal::Decimal;
use serde::Serialize;

use super::aggregate::totals;
use super::error::CalcResult;
use super::scaling::scale;
use crate::models::{Food, Meal, NutrientProfile};

/// Portion copied verbatim from the source food
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortionSnapshot {
    pub name: String,
    pub size: Decimal,
}

/// A food scaled to the consumed quantity.
///
/// `profile.reference_quantity` holds that quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodSnapshot {
    pub name: String,
    pub profile: NutrientProfile,
    pub portions: Vec<PortionSnapshot>,
}

/// A meal with every food snapshotted and the totals summed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealSnapshot {
    pub name: String,
    pub saved: bool,
    pub profile: NutrientProfile,
    pub foods: Vec<FoodSnapshot>,
}

/// Snapshot a live food at `quantity`, under `display_name`
pub fn snapshot_food(food: &Food, quantity: Decimal, display_name: &str) -> CalcResult<FoodSnapshot> {
    let profile = scale(&food.profile, quantity)?;
    let portions = food
        .portions
        .iter()
        .map(|p| PortionSnapshot {
            name: p.name.clone(),
            size: p.size,
        })
        .collect();

    Ok(FoodSnapshot {
        name: display_name.to_string(),
        profile,
        portions,
    })
}

/// Snapshot a food as one line of a journal meal
pub fn snapshot_meal_food(food: &Food, quantity: Decimal) -> CalcResult<FoodSnapshot> {
    snapshot_food(food, quantity, &food.name)
}

/// Snapshot a whole meal.
///
/// The result is unsaved; persistence flips `saved` once the owning journal
/// entry is committed.
pub fn snapshot_meal(meal: &Meal) -> CalcResult<MealSnapshot> {
    let foods = meal
        .foods
        .iter()
        .map(|mf| snapshot_meal_food(&mf.food, mf.quantity))
        .collect::<CalcResult<Vec<_>>>()?;

    let profile = totals(foods.iter().map(|f| &f.profile));

    Ok(MealSnapshot {
        name: meal.name.clone(),
        saved: false,
        profile,
        foods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealFood, Portion};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bread() -> Food {
        Food {
            id: 7,
            name: "Rye bread".to_string(),
            profile: NutrientProfile {
                reference_quantity: d("100"),
                kilojoules: d("1000"),
                proteins: d("8.5"),
                fiber: d("6"),
                ..NutrientProfile::zero()
            },
            portions: vec![
                Portion { id: 1, food_id: 7, name: "1 g".to_string(), size: d("1") },
                Portion { id: 2, food_id: 7, name: "100 g".to_string(), size: d("100") },
                Portion { id: 3, food_id: 7, name: "1 slice".to_string(), size: d("30") },
            ],
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_snapshot_food_scales_values_but_not_portions() {
        let snapshot = snapshot_food(&bread(), d("60"), "Breakfast bread").unwrap();

        assert_eq!(snapshot.name, "Breakfast bread");
        assert_eq!(snapshot.profile.reference_quantity, d("60"));
        assert_eq!(snapshot.profile.kilojoules, d("600.00"));
        assert_eq!(snapshot.profile.proteins, d("5.10"));
        assert_eq!(snapshot.portions.len(), 3);
        assert_eq!(snapshot.portions[2].name, "1 slice");
        assert_eq!(snapshot.portions[2].size, d("30"));
    }

    #[test]
    fn test_snapshot_meal_sums_foods_and_starts_unsaved() {
        let meal = Meal {
            id: 3,
            user_id: 1,
            name: "Sandwich".to_string(),
            foods: vec![
                MealFood { id: 1, meal_id: 3, food: bread(), quantity: d("60") },
                MealFood { id: 2, meal_id: 3, food: bread(), quantity: d("15") },
            ],
            created_at: String::new(),
            updated_at: String::new(),
        };

        let snapshot = snapshot_meal(&meal).unwrap();

        assert!(!snapshot.saved);
        assert_eq!(snapshot.name, "Sandwich");
        assert_eq!(snapshot.foods.len(), 2);
        assert_eq!(snapshot.foods[0].name, "Rye bread");
        assert_eq!(snapshot.profile.reference_quantity, d("75"));
        assert_eq!(snapshot.profile.kilojoules, d("750.00"));
        assert_eq!(snapshot.profile.fiber, d("4.50"));
    }
}
