//! Food Tools
//!
//! Tools for managing foods and their portions.

use rmcp::schemars;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{db_error, to_decimal, validate_name};
use crate::db::Database;
use crate::models::{
    limits, Food, FoodCreate, FoodUpdate, Nutrient, NutrientProfile, Portion, PortionCreate,
};

/// Nutrient values per 100 g. Energy in kJ; cholesterol, sodium, calcium and
/// phe in mg; the rest in g.
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct NutrientInput {
    pub kilojoules: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub fat: Option<f64>,
    /// Saturated fatty acids
    pub safa: Option<f64>,
    /// Trans fatty acids
    pub tfa: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub calcium: Option<f64>,
    /// Phenylalanine
    pub phe: Option<f64>,
}

impl NutrientInput {
    fn entries(&self) -> [(Nutrient, Option<f64>); 12] {
        [
            (Nutrient::Kilojoules, self.kilojoules),
            (Nutrient::Proteins, self.proteins),
            (Nutrient::Carbohydrates, self.carbohydrates),
            (Nutrient::Fiber, self.fiber),
            (Nutrient::Sugar, self.sugar),
            (Nutrient::Fat, self.fat),
            (Nutrient::Safa, self.safa),
            (Nutrient::Tfa, self.tfa),
            (Nutrient::Cholesterol, self.cholesterol),
            (Nutrient::Sodium, self.sodium),
            (Nutrient::Calcium, self.calcium),
            (Nutrient::Phe, self.phe),
        ]
    }

    /// Only the values that were given
    pub fn changes(&self) -> Result<Vec<(Nutrient, Decimal)>, String> {
        self.entries()
            .into_iter()
            .filter_map(|(nutrient, value)| value.map(|v| (nutrient, v)))
            .map(|(nutrient, value)| Ok((nutrient, to_decimal(nutrient.as_str(), value)?)))
            .collect()
    }

    /// A full profile against 100 g, missing values as zero
    pub fn to_profile(&self) -> Result<NutrientProfile, String> {
        let mut profile = NutrientProfile {
            reference_quantity: Decimal::from(Food::REFERENCE_QUANTITY),
            ..NutrientProfile::zero()
        };
        for (nutrient, value) in self.changes()? {
            profile.set(nutrient, value);
        }
        Ok(profile)
    }
}

/// Food summary for list/search results
#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub name: String,
    pub kilojoules: Decimal,
    pub proteins: Decimal,
    pub carbohydrates: Decimal,
    pub fat: Decimal,
}

impl From<&Food> for FoodSummary {
    fn from(food: &Food) -> Self {
        Self {
            id: food.id,
            name: food.name.clone(),
            kilojoules: food.profile.kilojoules,
            proteins: food.profile.proteins,
            carbohydrates: food.profile.carbohydrates,
            fat: food.profile.fat,
        }
    }
}

/// Full food detail response
#[derive(Debug, Serialize)]
pub struct FoodDetail {
    #[serde(flatten)]
    pub food: Food,
    pub meal_usage_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ListFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Add a new food with its protected portions
pub fn add_food(db: &Database, name: &str, nutrients: &NutrientInput) -> Result<Food, String> {
    let name = validate_name("Food", name, limits::FOOD_NAME)?;
    let data = FoodCreate {
        name,
        nutrients: nutrients.to_profile()?,
    };

    let food = db
        .with_transaction(|tx| Food::create(tx, &data))
        .map_err(|e| db_error("create food", e))?;

    tracing::info!(food_id = food.id, "created food '{}'", food.name);
    Ok(food)
}

/// Get a food with its portions and meal usage
pub fn get_food(db: &Database, id: i64) -> Result<Option<FoodDetail>, String> {
    tracing::debug!(food_id = id, "get food");
    db.with_conn(|conn| {
        let Some(food) = Food::get_by_id(conn, id)? else {
            return Ok(None);
        };
        let meal_usage_count = Food::get_meal_usage_count(conn, id)?;
        Ok(Some(FoodDetail { food, meal_usage_count }))
    })
    .map_err(|e| db_error("get food", e))
}

/// Search foods by name
pub fn search_foods(db: &Database, query: &str, limit: i64) -> Result<SearchFoodsResponse, String> {
    let limit = limit.clamp(1, 100);
    let foods = db
        .with_conn(|conn| Food::search(conn, query, limit))
        .map_err(|e| db_error("search foods", e))?;

    let items: Vec<FoodSummary> = foods.iter().map(FoodSummary::from).collect();
    let total = items.len();
    Ok(SearchFoodsResponse { items, total })
}

/// List foods by name with pagination
pub fn list_foods(db: &Database, limit: i64, offset: i64) -> Result<ListFoodsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let (foods, total) = db
        .with_conn(|conn| Ok((Food::list(conn, limit, offset)?, Food::count(conn)?)))
        .map_err(|e| db_error("list foods", e))?;

    Ok(ListFoodsResponse {
        items: foods.iter().map(FoodSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Update a food's name or nutrient values. Meals see the change at once;
/// journal entries keep their logged values.
pub fn update_food(
    db: &Database,
    id: i64,
    name: Option<&str>,
    nutrients: &NutrientInput,
) -> Result<Food, String> {
    let data = FoodUpdate {
        name: name
            .map(|n| validate_name("Food", n, limits::FOOD_NAME))
            .transpose()?,
        nutrients: nutrients.changes()?,
    };

    let updated = db
        .with_transaction(|tx| Food::update(tx, id, &data))
        .map_err(|e| db_error("update food", e))?;

    match updated {
        Some(food) => {
            tracing::info!(food_id = id, "updated food");
            Ok(food)
        }
        None => Err(format!("Food not found with id: {}", id)),
    }
}

/// Delete a food (blocked while any meal uses it)
pub fn delete_food(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let deleted = db
        .with_transaction(|tx| Food::delete(tx, id))
        .map_err(|e| db_error("delete food", e))?;

    if !deleted {
        return Err(format!("Food not found with id: {}", id));
    }
    tracing::info!(food_id = id, "deleted food");
    Ok(DeleteResponse { success: true, deleted_id: id })
}

/// Add a named portion to a food
pub fn add_portion(db: &Database, food_id: i64, name: &str, size: f64) -> Result<Portion, String> {
    let name = validate_name("Portion", name, limits::PORTION_NAME)?;
    let size = to_decimal("size", size)?;

    let data = PortionCreate { name, size };
    let portion = db
        .with_transaction(|tx| Portion::create(tx, food_id, &data))
        .map_err(|e| db_error("add portion", e))?;

    tracing::info!(food_id, portion_id = portion.id, "added portion '{}'", portion.name);
    Ok(portion)
}

/// Delete a portion of a food. The protected "1 g" and "100 g" portions stay.
pub fn delete_portion(db: &Database, food_id: i64, id: i64) -> Result<DeleteResponse, String> {
    let deleted = db
        .with_transaction(|tx| Portion::delete(tx, food_id, id))
        .map_err(|e| db_error("delete portion", e))?;

    if !deleted {
        return Err(format!("Portion {} not found for food {}", id, food_id));
    }
    tracing::info!(food_id, portion_id = id, "deleted portion");
    Ok(DeleteResponse { success: true, deleted_id: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use std::str::FromStr;

    fn bread() -> NutrientInput {
        NutrientInput {
            kilojoules: Some(1050.0),
            proteins: Some(8.5),
            carbohydrates: Some(45.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_food_creates_protected_portions() {
        let db = test_database();
        let food = add_food(&db, "  Rye bread ", &bread()).unwrap();

        assert_eq!(food.name, "Rye bread");
        assert_eq!(food.profile.reference_quantity, Decimal::from(100));
        assert_eq!(food.profile.proteins, Decimal::from_str("8.5").unwrap());
        assert_eq!(food.profile.fat, Decimal::ZERO);
        let names: Vec<&str> = food.portions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["1 g", "100 g"]);
    }

    #[test]
    fn test_add_food_rejects_bad_input() {
        let db = test_database();
        assert!(add_food(&db, " ", &bread()).is_err());

        let negative = NutrientInput {
            fat: Some(-1.0),
            ..Default::default()
        };
        let err = add_food(&db, "Oil", &negative).unwrap_err();
        assert!(err.contains("fat"));
    }

    #[test]
    fn test_update_only_touches_given_values() {
        let db = test_database();
        let food = add_food(&db, "Rye bread", &bread()).unwrap();

        let change = NutrientInput {
            fat: Some(2.0),
            ..Default::default()
        };
        let updated = update_food(&db, food.id, Some("Dark rye"), &change).unwrap();
        assert_eq!(updated.name, "Dark rye");
        assert_eq!(updated.profile.fat, Decimal::from(2));
        assert_eq!(updated.profile.kilojoules, Decimal::from(1050));

        assert!(update_food(&db, 999, None, &change).is_err());
    }

    #[test]
    fn test_portion_tools() {
        let db = test_database();
        let food = add_food(&db, "Rye bread", &bread()).unwrap();

        let slice = add_portion(&db, food.id, "1 slice", 30.0).unwrap();
        assert_eq!(slice.size, Decimal::from(30));
        assert!(add_portion(&db, food.id, "1 slice", 35.0).is_err());
        assert!(add_portion(&db, food.id, "crumb", -1.0).is_err());

        let protected = food.portions[0].id;
        assert!(delete_portion(&db, food.id, protected).is_err());
        assert!(delete_portion(&db, food.id, slice.id).unwrap().success);
        assert!(delete_portion(&db, food.id, slice.id).is_err());
    }

    #[test]
    fn test_get_search_list_delete() {
        let db = test_database();
        let food = add_food(&db, "Rye bread", &bread()).unwrap();
        add_food(&db, "Apple", &NutrientInput::default()).unwrap();

        let detail = get_food(&db, food.id).unwrap().unwrap();
        assert_eq!(detail.meal_usage_count, 0);
        assert!(get_food(&db, 999).unwrap().is_none());

        assert_eq!(search_foods(&db, "rye", 20).unwrap().total, 1);

        let listed = list_foods(&db, 50, 0).unwrap();
        assert_eq!(listed.total, 2);
        assert_eq!(listed.items[0].name, "Apple");

        assert!(delete_food(&db, food.id).unwrap().success);
        assert!(delete_food(&db, food.id).is_err());
    }
}
