//! Meal model
//!
//! A user's composition of foods. Totals are never stored; see
//! `nutrition::compose_meal`.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{get_decimal, DbError, DbResult, SqlDecimal};
use super::food::{lookup_all, Food};

/// Maximum meal name length
pub const MAX_NAME_LEN: usize = 75;

/// A meal with its foods loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub foods: Vec<MealFood>,
    pub created_at: String,
    pub updated_at: String,
}

/// A food within a meal, at an absolute quantity in grams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealFood {
    pub id: i64,
    pub meal_id: i64,
    pub food: Food,
    pub quantity: Decimal,
}

/// Data for creating a meal.
///
/// Every listed food is added at `quantity` (multiplier × portion size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCreate {
    pub name: String,
    pub food_ids: Vec<i64>,
    pub quantity: Decimal,
}

/// Check a meal name: 1 to 75 characters, not only whitespace
pub fn validate_meal_name(name: &str) -> DbResult<()> {
    if name.trim().is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(DbError::InvalidData(format!(
            "Meal name must be 1 to {} characters and not only whitespace",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

impl Meal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            foods: Vec::new(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn with_foods(conn: &Connection, mut meal: Meal) -> DbResult<Meal> {
        meal.foods = MealFood::list_for_meal(conn, meal.id)?;
        Ok(meal)
    }

    fn touch(conn: &Connection, id: i64) -> DbResult<()> {
        conn.execute("UPDATE meals SET updated_at = datetime('now') WHERE id = ?1", [id])?;
        Ok(())
    }

    fn insert_foods(conn: &Connection, meal_id: i64, food_ids: &[i64], quantity: Decimal) -> DbResult<()> {
        if food_ids.is_empty() {
            return Err(DbError::InvalidData("Must provide at least one food".to_string()));
        }

        let foods = lookup_all(conn, food_ids)?;
        for food in foods {
            conn.execute(
                "INSERT INTO meal_foods (meal_id, food_id, quantity) VALUES (?1, ?2, ?3)",
                params![meal_id, food.id, SqlDecimal(quantity)],
            )?;
        }
        Ok(())
    }

    /// Create a meal with its foods. Call inside a transaction.
    pub fn create(conn: &Connection, user_id: i64, data: &MealCreate) -> DbResult<Self> {
        validate_meal_name(&data.name)?;
        if data.food_ids.is_empty() {
            return Err(DbError::InvalidData("Must provide at least one food".to_string()));
        }

        conn.execute(
            "INSERT INTO meals (user_id, name) VALUES (?1, ?2)",
            params![user_id, data.name.trim()],
        )?;

        let id = conn.last_insert_rowid();
        Self::insert_foods(conn, id, &data.food_ids, data.quantity)?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a meal by ID, with foods
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(meal) => Ok(Some(Self::with_foods(conn, meal)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a meal that must belong to `user_id`
    pub fn get_for_user(conn: &Connection, user_id: i64, id: i64) -> DbResult<Self> {
        let meal = Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::RecordNotFound(format!("Meal {} not found", id)))?;

        if meal.user_id != user_id {
            return Err(DbError::Forbidden(format!(
                "Meal {} does not belong to user {}",
                id, user_id
            )));
        }
        Ok(meal)
    }

    /// List a user's meals, most recently changed first
    pub fn list_for_user(conn: &Connection, user_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM meals
            WHERE user_id = ?1
            ORDER BY updated_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#
        )?;

        let meals = stmt
            .query_map(params![user_id, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        meals
            .into_iter()
            .map(|meal| Self::with_foods(conn, meal))
            .collect()
    }

    /// Search a user's meals by name
    pub fn search(conn: &Connection, user_id: i64, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query.trim());
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM meals
            WHERE user_id = ?1 AND name LIKE ?2
            ORDER BY name ASC
            LIMIT ?3
            "#
        )?;

        let meals = stmt
            .query_map(params![user_id, search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        meals
            .into_iter()
            .map(|meal| Self::with_foods(conn, meal))
            .collect()
    }

    /// Add foods to an existing meal. Call inside a transaction.
    pub fn add_foods(
        conn: &Connection,
        user_id: i64,
        id: i64,
        food_ids: &[i64],
        quantity: Decimal,
    ) -> DbResult<Self> {
        Self::get_for_user(conn, user_id, id)?;
        Self::insert_foods(conn, id, food_ids, quantity)?;
        Self::touch(conn, id)?;
        Self::get_for_user(conn, user_id, id)
    }

    /// Rename a meal
    pub fn rename(conn: &Connection, user_id: i64, id: i64, name: &str) -> DbResult<Self> {
        validate_meal_name(name)?;
        Self::get_for_user(conn, user_id, id)?;

        conn.execute(
            "UPDATE meals SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![name.trim(), id],
        )?;

        Self::get_for_user(conn, user_id, id)
    }

    /// Delete a meal and its foods.
    /// Returns Ok(false) if not found. Journal snapshots are unaffected.
    pub fn delete(conn: &Connection, user_id: i64, id: i64) -> DbResult<bool> {
        match Self::get_for_user(conn, user_id, id) {
            Ok(_) => {}
            Err(DbError::RecordNotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        }

        let rows = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

impl MealFood {
    fn list_for_meal(conn: &Connection, meal_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, meal_id, food_id, quantity FROM meal_foods WHERE meal_id = ?1 ORDER BY id"
        )?;

        let rows = stmt
            .query_map([meal_id], |row| {
                Ok((
                    row.get::<_, i64>("id")?,
                    row.get::<_, i64>("food_id")?,
                    get_decimal(row, "quantity")?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let food_ids: Vec<i64> = rows.iter().map(|(_, food_id, _)| *food_id).collect();
        let foods = lookup_all(conn, &food_ids)?;

        Ok(rows
            .into_iter()
            .zip(foods)
            .map(|((id, _, quantity), food)| MealFood {
                id,
                meal_id,
                food,
                quantity,
            })
            .collect())
    }

    fn find_in_meal(conn: &Connection, user_id: i64, meal_id: i64, id: i64) -> DbResult<Meal> {
        let meal = Meal::get_for_user(conn, user_id, meal_id)?;
        if !meal.foods.iter().any(|mf| mf.id == id) {
            return Err(DbError::RecordNotFound(format!(
                "Meal food {} not found in meal {}",
                id, meal_id
            )));
        }
        Ok(meal)
    }

    /// Change the quantity of one food in a meal
    pub fn update_quantity(
        conn: &Connection,
        user_id: i64,
        meal_id: i64,
        id: i64,
        quantity: Decimal,
    ) -> DbResult<Meal> {
        Self::find_in_meal(conn, user_id, meal_id, id)?;

        conn.execute(
            "UPDATE meal_foods SET quantity = ?1 WHERE id = ?2",
            params![SqlDecimal(quantity), id],
        )?;
        Meal::touch(conn, meal_id)?;

        Meal::get_for_user(conn, user_id, meal_id)
    }

    /// Remove one food from a meal
    pub fn delete(conn: &Connection, user_id: i64, meal_id: i64, id: i64) -> DbResult<Meal> {
        Self::find_in_meal(conn, user_id, meal_id, id)?;

        conn.execute("DELETE FROM meal_foods WHERE id = ?1", [id])?;
        Meal::touch(conn, meal_id)?;

        Meal::get_for_user(conn, user_id, meal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::models::{FoodCreate, NutrientProfile};
    use crate::nutrition::compose_meal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn food(conn: &Connection, name: &str, kilojoules: &str) -> Food {
        let data = FoodCreate {
            name: name.to_string(),
            nutrients: NutrientProfile {
                kilojoules: d(kilojoules),
                ..NutrientProfile::zero()
            },
        };
        Food::create(conn, &data).unwrap()
    }

    fn meal(conn: &Connection, name: &str, food_ids: Vec<i64>, quantity: &str) -> Meal {
        let data = MealCreate {
            name: name.to_string(),
            food_ids,
            quantity: d(quantity),
        };
        Meal::create(conn, 1, &data).unwrap()
    }

    #[test]
    fn test_create_and_compose() {
        let conn = test_connection();
        let a = food(&conn, "A", "10");
        let b = food(&conn, "B", "1");

        let created = meal(&conn, "Breakfast bowl", vec![a.id], "100");
        let with_b = Meal::add_foods(&conn, 1, created.id, &[b.id], d("10")).unwrap();

        let composition = compose_meal(&with_b).unwrap();
        assert_eq!(composition.totals.reference_quantity, d("110.00"));
        assert_eq!(composition.totals.kilojoules, d("10.10"));
    }

    #[test]
    fn test_name_rules() {
        let conn = test_connection();
        let a = food(&conn, "A", "10");

        let too_long = "x".repeat(76);
        for bad in ["", "   ", too_long.as_str()] {
            let data = MealCreate {
                name: bad.to_string(),
                food_ids: vec![a.id],
                quantity: d("1"),
            };
            assert!(matches!(Meal::create(&conn, 1, &data), Err(DbError::InvalidData(_))));
        }

        let data = MealCreate {
            name: "Empty".to_string(),
            food_ids: Vec::new(),
            quantity: d("1"),
        };
        assert!(matches!(Meal::create(&conn, 1, &data), Err(DbError::InvalidData(_))));

        let created = meal(&conn, "Soup", vec![a.id], "250");
        let renamed = Meal::rename(&conn, 1, created.id, &"y".repeat(75)).unwrap();
        assert_eq!(renamed.name.len(), 75);
    }

    #[test]
    fn test_other_users_meal_is_forbidden() {
        let conn = test_connection();
        let a = food(&conn, "A", "10");
        let created = meal(&conn, "Mine", vec![a.id], "100");

        assert!(matches!(Meal::get_for_user(&conn, 2, created.id), Err(DbError::Forbidden(_))));
        assert!(matches!(Meal::rename(&conn, 2, created.id, "Theirs"), Err(DbError::Forbidden(_))));
        assert!(matches!(Meal::get_for_user(&conn, 1, 999), Err(DbError::RecordNotFound(_))));
    }

    #[test]
    fn test_food_in_meal_cannot_be_deleted() {
        let conn = test_connection();
        let a = food(&conn, "A", "10");
        let created = meal(&conn, "Mine", vec![a.id], "100");

        assert!(matches!(Food::delete(&conn, a.id), Err(DbError::RecordNotDeletable(_))));
        assert!(Food::get_by_id(&conn, a.id).unwrap().is_some());

        assert!(Meal::delete(&conn, 1, created.id).unwrap());
        assert!(Food::delete(&conn, a.id).unwrap());
    }

    #[test]
    fn test_update_and_remove_meal_food() {
        let conn = test_connection();
        let a = food(&conn, "A", "10");
        let b = food(&conn, "B", "20");
        let created = meal(&conn, "Plate", vec![a.id, b.id], "50");
        let first = created.foods[0].id;
        let second = created.foods[1].id;

        let updated = MealFood::update_quantity(&conn, 1, created.id, first, d("150")).unwrap();
        assert_eq!(updated.foods[0].quantity, d("150"));

        let remaining = MealFood::delete(&conn, 1, created.id, second).unwrap();
        assert_eq!(remaining.foods.len(), 1);
        assert_eq!(remaining.foods[0].food.name, "A");

        let missing = MealFood::delete(&conn, 1, created.id, second);
        assert!(matches!(missing, Err(DbError::RecordNotFound(_))));
    }

    #[test]
    fn test_unknown_food_is_rejected() {
        let conn = test_connection();
        let data = MealCreate {
            name: "Ghost".to_string(),
            food_ids: vec![404],
            quantity: d("1"),
        };
        assert!(matches!(Meal::create(&conn, 1, &data), Err(DbError::RecordNotFound(_))));
    }

    #[test]
    fn test_search_and_list() {
        let conn = test_connection();
        let a = food(&conn, "A", "10");
        meal(&conn, "Pasta night", vec![a.id], "100");
        meal(&conn, "Pasta salad", vec![a.id], "100");
        meal(&conn, "Porridge", vec![a.id], "100");

        assert_eq!(Meal::search(&conn, 1, "pasta", 10).unwrap().len(), 2);
        assert_eq!(Meal::search(&conn, 2, "pasta", 10).unwrap().len(), 0);
        assert_eq!(Meal::list_for_user(&conn, 1, 10, 0).unwrap().len(), 3);
    }
}
