//! Food model
//!
//! A food's nutrients are stored per reference quantity (100 g). The reference
//! quantity is fixed at creation.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult, SqlDecimal};
use super::nutrition::{Nutrient, NutrientProfile, NUTRIENT_COLUMNS};
use super::portion::Portion;

/// Maximum food name length
pub const MAX_NAME_LEN: usize = 255;

/// A food with its portions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub profile: NutrientProfile,
    pub portions: Vec<Portion>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a food; values are per 100 g
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodCreate {
    pub name: String,
    pub nutrients: NutrientProfile,
}

/// Data for updating a food. The reference quantity cannot change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodUpdate {
    pub name: Option<String>,
    pub nutrients: Vec<(Nutrient, Decimal)>,
}

/// Resolves food ids to foods
pub trait FoodLookup {
    /// Get a food or `RecordNotFound`
    fn food_by_id(&self, id: i64) -> DbResult<Food>;
}

impl FoodLookup for Connection {
    fn food_by_id(&self, id: i64) -> DbResult<Food> {
        Food::get_by_id(self, id)?
            .ok_or_else(|| DbError::RecordNotFound(format!("Food {} not found", id)))
    }
}

impl FoodLookup for HashMap<i64, Food> {
    fn food_by_id(&self, id: i64) -> DbResult<Food> {
        self.get(&id)
            .cloned()
            .ok_or_else(|| DbError::RecordNotFound(format!("Food {} not found", id)))
    }
}

/// Resolve several ids, failing on the first unknown one
pub fn lookup_all<L: FoodLookup + ?Sized>(lookup: &L, ids: &[i64]) -> DbResult<Vec<Food>> {
    ids.iter().map(|&id| lookup.food_by_id(id)).collect()
}

impl Food {
    /// Default reference basis for new foods
    pub const REFERENCE_QUANTITY: i64 = 100;

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            profile: NutrientProfile::from_row(row, "quantity")?,
            portions: Vec::new(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn with_portions(conn: &Connection, mut food: Food) -> DbResult<Food> {
        food.portions = Portion::list_for_food(conn, food.id)?;
        Ok(food)
    }

    /// Create a food together with its protected "1 g" and "100 g" portions.
    ///
    /// Writes several rows; call inside a transaction.
    pub fn create(conn: &Connection, data: &FoodCreate) -> DbResult<Self> {
        let values = data.nutrients.sql_values();
        let sql = format!(
            "INSERT INTO foods (name, quantity, {}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            NUTRIENT_COLUMNS
        );
        let mut params_vec: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(14);
        let name = data.name.trim();
        let reference = SqlDecimal(Decimal::from(Self::REFERENCE_QUANTITY));
        params_vec.push(&name);
        params_vec.push(&reference);
        for value in &values {
            params_vec.push(value);
        }
        conn.execute(&sql, params_vec.as_slice())?;

        let id = conn.last_insert_rowid();
        Portion::create_protected(conn, id)?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food by ID, with portions
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(food) => Ok(Some(Self::with_portions(conn, food)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search foods by name
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query.trim());
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM foods
            WHERE name LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#
        )?;

        let foods = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        foods
            .into_iter()
            .map(|food| Self::with_portions(conn, food))
            .collect()
    }

    /// List foods sorted by name
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM foods ORDER BY name ASC, id ASC LIMIT ?1 OFFSET ?2"
        )?;

        let foods = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        foods
            .into_iter()
            .map(|food| Self::with_portions(conn, food))
            .collect()
    }

    /// Update a food's name and nutrient values
    pub fn update(conn: &Connection, id: i64, data: &FoodUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.trim().to_string()));
        }
        for (nutrient, value) in &data.nutrients {
            updates.push(format!("{} = ?{}", nutrient.as_str(), params_vec.len() + 1));
            params_vec.push(Box::new(SqlDecimal(*value)));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE foods SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Get the count of meal foods referencing this food
    pub fn get_meal_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meal_foods WHERE food_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count total foods
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a food and its portions.
    /// Returns Ok(false) if not found; refuses while any meal uses the food.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let food = match Self::get_by_id(conn, id)? {
            Some(food) => food,
            None => return Ok(false),
        };

        let usage = Self::get_meal_usage_count(conn, id)?;
        if usage > 0 {
            return Err(DbError::RecordNotDeletable(format!(
                "Food '{}' is used in {} meal(s) and cannot be deleted",
                food.name, usage
            )));
        }

        let rows = conn.execute("DELETE FROM foods WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
