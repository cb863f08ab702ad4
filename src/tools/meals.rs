//! Meal Tools
//!
//! Tools for composing reusable meals out of foods.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{db_error, quantity, to_decimal};
use crate::db::{DbError, Database};
use crate::models::{validate_meal_name, Meal, MealCreate, MealFood, NutrientProfile};
use crate::nutrition::{compose_meal, AdjustedMealFood};

/// Meal with every food scaled and the totals recomputed from live food values
#[derive(Debug, Serialize)]
pub struct MealDetail {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub foods: Vec<AdjustedMealFood>,
    pub totals: NutrientProfile,
    pub created_at: String,
    pub updated_at: String,
}

impl MealDetail {
    fn from_meal(meal: Meal) -> Result<Self, DbError> {
        let composition = compose_meal(&meal)?;
        Ok(Self {
            id: meal.id,
            user_id: meal.user_id,
            name: meal.name,
            foods: composition.foods,
            totals: composition.totals,
            created_at: meal.created_at,
            updated_at: meal.updated_at,
        })
    }
}

/// Meal summary for list/search results
#[derive(Debug, Serialize)]
pub struct MealSummary {
    pub id: i64,
    pub name: String,
    pub food_count: usize,
    pub quantity: Decimal,
    pub kilojoules: Decimal,
}

impl TryFrom<Meal> for MealSummary {
    type Error = DbError;

    fn try_from(meal: Meal) -> Result<Self, Self::Error> {
        let detail = MealDetail::from_meal(meal)?;
        Ok(Self {
            id: detail.id,
            name: detail.name,
            food_count: detail.foods.len(),
            quantity: detail.totals.reference_quantity,
            kilojoules: detail.totals.kilojoules,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    pub items: Vec<MealSummary>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteMealResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn meal_quantity(multiplier: f64, portion_size: f64) -> Result<Decimal, String> {
    Ok(quantity(
        to_decimal("multiplier", multiplier)?,
        to_decimal("portion_size", portion_size)?,
    ))
}

/// Create a meal. Every listed food is added at multiplier × portion size grams.
pub fn create_meal(
    db: &Database,
    user_id: i64,
    name: &str,
    food_ids: Vec<i64>,
    multiplier: f64,
    portion_size: f64,
) -> Result<MealDetail, String> {
    if food_ids.is_empty() {
        return Err("A meal needs at least one food".to_string());
    }
    let data = MealCreate {
        name: name.trim().to_string(),
        food_ids,
        quantity: meal_quantity(multiplier, portion_size)?,
    };

    let meal = db
        .with_transaction(|tx| {
            let meal = Meal::create(tx, user_id, &data)?;
            MealDetail::from_meal(meal)
        })
        .map_err(|e| db_error("create meal", e))?;

    tracing::info!(user_id, meal_id = meal.id, "created meal '{}'", meal.name);
    Ok(meal)
}

/// Get one of the user's meals
pub fn get_meal(db: &Database, user_id: i64, id: i64) -> Result<MealDetail, String> {
    tracing::debug!(user_id, meal_id = id, "get meal");
    db.with_conn(|conn| MealDetail::from_meal(Meal::get_for_user(conn, user_id, id)?))
        .map_err(|e| db_error("get meal", e))
}

/// List the user's meals, optionally filtered by name
pub fn list_meals(
    db: &Database,
    user_id: i64,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListMealsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let meals = db
        .with_conn(|conn| match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => Meal::search(conn, user_id, q, limit),
            None => Meal::list_for_user(conn, user_id, limit, offset),
        })
        .map_err(|e| db_error("list meals", e))?;

    let items = meals
        .into_iter()
        .map(MealSummary::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| db_error("list meals", e))?;

    Ok(ListMealsResponse { items, limit, offset })
}

/// Add foods to a meal at multiplier × portion size grams each
pub fn add_foods_to_meal(
    db: &Database,
    user_id: i64,
    id: i64,
    food_ids: Vec<i64>,
    multiplier: f64,
    portion_size: f64,
) -> Result<MealDetail, String> {
    if food_ids.is_empty() {
        return Err("No foods given".to_string());
    }
    let quantity = meal_quantity(multiplier, portion_size)?;

    let meal = db
        .with_transaction(|tx| MealDetail::from_meal(Meal::add_foods(tx, user_id, id, &food_ids, quantity)?))
        .map_err(|e| db_error("add foods to meal", e))?;

    tracing::info!(user_id, meal_id = id, added = food_ids.len(), "added foods to meal");
    Ok(meal)
}

/// Rename a meal
pub fn rename_meal(db: &Database, user_id: i64, id: i64, name: &str) -> Result<MealDetail, String> {
    validate_meal_name(name).map_err(|e| db_error("rename meal", e))?;

    let meal = db
        .with_transaction(|tx| MealDetail::from_meal(Meal::rename(tx, user_id, id, name)?))
        .map_err(|e| db_error("rename meal", e))?;

    tracing::info!(user_id, meal_id = id, "renamed meal to '{}'", meal.name);
    Ok(meal)
}

/// Change the quantity of one food in a meal
pub fn update_meal_food(
    db: &Database,
    user_id: i64,
    meal_id: i64,
    meal_food_id: i64,
    multiplier: f64,
    portion_size: f64,
) -> Result<MealDetail, String> {
    let quantity = meal_quantity(multiplier, portion_size)?;

    let meal = db
        .with_transaction(|tx| {
            MealDetail::from_meal(MealFood::update_quantity(tx, user_id, meal_id, meal_food_id, quantity)?)
        })
        .map_err(|e| db_error("update meal food", e))?;

    tracing::info!(user_id, meal_id, meal_food_id, "updated meal food quantity to {}", quantity);
    Ok(meal)
}

/// Remove one food from a meal
pub fn remove_meal_food(
    db: &Database,
    user_id: i64,
    meal_id: i64,
    meal_food_id: i64,
) -> Result<MealDetail, String> {
    let meal = db
        .with_transaction(|tx| MealDetail::from_meal(MealFood::delete(tx, user_id, meal_id, meal_food_id)?))
        .map_err(|e| db_error("remove meal food", e))?;

    tracing::info!(user_id, meal_id, meal_food_id, "removed food from meal");
    Ok(meal)
}

/// Delete a meal. Journal entries logged from it are kept.
pub fn delete_meal(db: &Database, user_id: i64, id: i64) -> Result<DeleteMealResponse, String> {
    let deleted = db
        .with_transaction(|tx| Meal::delete(tx, user_id, id))
        .map_err(|e| db_error("delete meal", e))?;

    if !deleted {
        return Err(format!("Meal not found with id: {}", id));
    }
    tracing::info!(user_id, meal_id = id, "deleted meal");
    Ok(DeleteMealResponse { success: true, deleted_id: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use crate::tools::foods::{add_food, delete_food, update_food, NutrientInput};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn food(db: &Database, name: &str, kilojoules: f64) -> i64 {
        let nutrients = NutrientInput {
            kilojoules: Some(kilojoules),
            ..Default::default()
        };
        add_food(db, name, &nutrients).unwrap().id
    }

    #[test]
    fn test_create_meal_scales_and_totals() {
        let db = test_database();
        let a = food(&db, "A", 10.0);

        let meal = create_meal(&db, 1, "Lunch box", vec![a], 2.0, 50.0).unwrap();
        assert_eq!(meal.foods.len(), 1);
        assert_eq!(meal.foods[0].quantity, d("100"));
        assert_eq!(meal.totals.kilojoules, d("10.00"));

        let b = food(&db, "B", 10.0);
        let meal = add_foods_to_meal(&db, 1, meal.id, vec![b], 1.0, 10.0).unwrap();
        assert_eq!(meal.totals.reference_quantity, d("110.00"));
        assert_eq!(meal.totals.kilojoules, d("11.00"));
    }

    #[test]
    fn test_meal_totals_follow_food_edits() {
        let db = test_database();
        let a = food(&db, "A", 10.0);
        let meal = create_meal(&db, 1, "Snack", vec![a], 1.0, 100.0).unwrap();

        let change = NutrientInput {
            kilojoules: Some(20.0),
            ..Default::default()
        };
        update_food(&db, a, None, &change).unwrap();

        let meal = get_meal(&db, 1, meal.id).unwrap();
        assert_eq!(meal.totals.kilojoules, d("20.00"));
    }

    #[test]
    fn test_create_meal_validation() {
        let db = test_database();
        let a = food(&db, "A", 10.0);

        assert!(create_meal(&db, 1, "Empty", vec![], 1.0, 1.0).is_err());
        assert!(create_meal(&db, 1, " ", vec![a], 1.0, 1.0).is_err());
        assert!(create_meal(&db, 1, "Ghost", vec![999], 1.0, 1.0).is_err());
        assert!(create_meal(&db, 1, "Negative", vec![a], -1.0, 1.0).is_err());
    }

    #[test]
    fn test_meal_is_private_to_its_user() {
        let db = test_database();
        let a = food(&db, "A", 10.0);
        let meal = create_meal(&db, 1, "Mine", vec![a], 1.0, 100.0).unwrap();

        assert!(get_meal(&db, 2, meal.id).is_err());
        assert!(rename_meal(&db, 2, meal.id, "Theirs").is_err());
        assert!(delete_meal(&db, 2, meal.id).is_err());
        assert!(list_meals(&db, 2, None, 50, 0).unwrap().items.is_empty());
        assert_eq!(list_meals(&db, 1, Some("mi"), 50, 0).unwrap().items.len(), 1);
    }

    #[test]
    fn test_meal_food_edits_and_delete() {
        let db = test_database();
        let a = food(&db, "A", 100.0);
        let b = food(&db, "B", 100.0);
        let meal = create_meal(&db, 1, "Pair", vec![a, b], 1.0, 100.0).unwrap();

        // a used food cannot be deleted
        assert!(delete_food(&db, a).is_err());

        let first = meal.foods[0].meal_food_id;
        let meal = update_meal_food(&db, 1, meal.id, first, 0.5, 100.0).unwrap();
        assert_eq!(meal.totals.kilojoules, d("150.00"));

        let meal = remove_meal_food(&db, 1, meal.id, first).unwrap();
        assert_eq!(meal.totals.kilojoules, d("100.00"));

        let renamed = rename_meal(&db, 1, meal.id, "Single").unwrap();
        assert_eq!(renamed.name, "Single");

        assert!(delete_meal(&db, 1, meal.id).unwrap().success);
        assert!(delete_food(&db, a).unwrap().success);
    }
}
