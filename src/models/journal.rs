//! Journal model
//!
//! A dated, meal-typed entry owning exactly one food or meal snapshot.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{snapshot_food, snapshot_meal};
use super::food::FoodLookup;
use super::journal_food::JournalFood;
use super::journal_meal::JournalMeal;
use super::meal::Meal;
use super::nutrition::NutrientProfile;

/// Meal type enum, ordered through the day and stored as its ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealType {
    Breakfast,
    MidMorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::MidMorningSnack,
        MealType::Lunch,
        MealType::AfternoonSnack,
        MealType::Dinner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "BREAKFAST",
            MealType::MidMorningSnack => "MID_MORNING_SNACK",
            MealType::Lunch => "LUNCH",
            MealType::AfternoonSnack => "AFTERNOON_SNACK",
            MealType::Dinner => "DINNER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }

    pub fn ordinal(&self) -> i64 {
        *self as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

impl ToSql for MealType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.ordinal()))
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let ordinal = i64::column_result(value)?;
        MealType::from_ordinal(ordinal).ok_or(FromSqlError::OutOfRange(ordinal))
    }
}

/// The snapshot an entry owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "snapshot", rename_all = "lowercase")]
pub enum JournalItem {
    Food(JournalFood),
    Meal(JournalMeal),
}

impl JournalItem {
    /// Scaled values of the logged food, or totals of the logged meal
    pub fn profile(&self) -> &NutrientProfile {
        match self {
            JournalItem::Food(food) => &food.profile,
            JournalItem::Meal(meal) => &meal.profile,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            JournalItem::Food(food) => &food.name,
            JournalItem::Meal(meal) => &meal.name,
        }
    }

    pub fn journal_food_id(&self) -> Option<i64> {
        match self {
            JournalItem::Food(food) => Some(food.id),
            JournalItem::Meal(_) => None,
        }
    }

    pub fn journal_meal_id(&self) -> Option<i64> {
        match self {
            JournalItem::Food(_) => None,
            JournalItem::Meal(meal) => Some(meal.id),
        }
    }
}

/// A journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub id: i64,
    pub user_id: i64,
    pub consumed_at: NaiveDate,
    pub meal_type: MealType,
    pub item: JournalItem,
}

/// Data for logging a food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalFoodCreate {
    pub consumed_at: NaiveDate,
    pub meal_type: MealType,
    pub food_id: i64,
    /// Absolute grams (multiplier × portion size)
    pub quantity: Decimal,
    /// Defaults to the food's name
    pub name: Option<String>,
}

/// Data for logging a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalMealCreate {
    pub consumed_at: NaiveDate,
    pub meal_type: MealType,
    pub meal_id: i64,
}

/// Data for updating a journal entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalUpdate {
    pub consumed_at: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
}

struct JournalRow {
    id: i64,
    user_id: i64,
    consumed_at: NaiveDate,
    meal_type: MealType,
    journal_food_id: Option<i64>,
    journal_meal_id: Option<i64>,
}

impl JournalRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            consumed_at: row.get("consumed_at")?,
            meal_type: row.get("meal_type")?,
            journal_food_id: row.get("journal_food_id")?,
            journal_meal_id: row.get("journal_meal_id")?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, consumed_at, meal_type, journal_food_id, journal_meal_id FROM journals";

impl Journal {
    fn resolve(conn: &Connection, row: JournalRow) -> DbResult<Self> {
        let item = match (row.journal_food_id, row.journal_meal_id) {
            (Some(food_id), None) => JournalItem::Food(
                JournalFood::get_by_id(conn, food_id)?.ok_or_else(|| {
                    DbError::InvalidData(format!("Journal {} lost its food snapshot", row.id))
                })?,
            ),
            (None, Some(meal_id)) => JournalItem::Meal(
                JournalMeal::get_by_id(conn, meal_id)?.ok_or_else(|| {
                    DbError::InvalidData(format!("Journal {} lost its meal snapshot", row.id))
                })?,
            ),
            _ => {
                return Err(DbError::InvalidData(format!(
                    "Journal {} must reference exactly one snapshot",
                    row.id
                )))
            }
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            consumed_at: row.consumed_at,
            meal_type: row.meal_type,
            item,
        })
    }

    fn query(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, JournalRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| Self::resolve(conn, row)).collect()
    }

    /// Snapshot a food and log it. Call inside a transaction.
    pub fn log_food(conn: &Connection, user_id: i64, data: &JournalFoodCreate) -> DbResult<Self> {
        let food = conn.food_by_id(data.food_id)?;
        let name = data
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&food.name);

        let snapshot = snapshot_food(&food, data.quantity, name)?;
        let journal_food = JournalFood::create(conn, &snapshot)?;

        conn.execute(
            "INSERT INTO journals (user_id, consumed_at, meal_type, journal_food_id) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, data.consumed_at, data.meal_type, journal_food.id],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_for_user(conn, user_id, id)
    }

    /// Snapshot one of the user's meals and log it. Call inside a transaction.
    ///
    /// The snapshot is stored unsaved first and flagged saved together with
    /// the journal row, so an aborted log leaves only a sweepable orphan.
    pub fn log_meal(conn: &Connection, user_id: i64, data: &JournalMealCreate) -> DbResult<Self> {
        let meal = Meal::get_for_user(conn, user_id, data.meal_id)?;
        let snapshot = snapshot_meal(&meal)?;
        let journal_meal = JournalMeal::create_unsaved(conn, &snapshot)?;

        conn.execute(
            "INSERT INTO journals (user_id, consumed_at, meal_type, journal_meal_id) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, data.consumed_at, data.meal_type, journal_meal.id],
        )?;
        let id = conn.last_insert_rowid();
        JournalMeal::mark_saved(conn, journal_meal.id)?;

        Self::get_for_user(conn, user_id, id)
    }

    /// Get an entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row([id], JournalRow::from_row);
        match result {
            Ok(row) => Ok(Some(Self::resolve(conn, row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get an entry that must belong to `user_id`
    pub fn get_for_user(conn: &Connection, user_id: i64, id: i64) -> DbResult<Self> {
        let entry = Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::RecordNotFound(format!("Journal entry {} not found", id)))?;

        if entry.user_id != user_id {
            return Err(DbError::Forbidden(format!(
                "Journal entry {} does not belong to user {}",
                id, user_id
            )));
        }
        Ok(entry)
    }

    /// Entries of one day, ordered by meal type
    pub fn list_for_day(conn: &Connection, user_id: i64, date: NaiveDate) -> DbResult<Vec<Self>> {
        Self::list_between(conn, user_id, date, date)
    }

    /// Entries in `start..=end`, ordered by date, meal type and id
    pub fn list_between(
        conn: &Connection,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<Self>> {
        let sql = format!(
            "{} WHERE user_id = ?1 AND consumed_at BETWEEN ?2 AND ?3 ORDER BY consumed_at, meal_type, id",
            SELECT_COLUMNS
        );
        Self::query(conn, &sql, &[&user_id, &start, &end])
    }

    /// Move an entry to another date or meal type
    pub fn update(conn: &Connection, user_id: i64, id: i64, data: &JournalUpdate) -> DbResult<Self> {
        Self::get_for_user(conn, user_id, id)?;

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(consumed_at) = data.consumed_at {
            updates.push(format!("consumed_at = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(consumed_at));
        }
        if let Some(meal_type) = data.meal_type {
            updates.push(format!("meal_type = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(meal_type));
        }

        if !updates.is_empty() {
            updates.push("updated_at = datetime('now')".to_string());
            let sql = format!(
                "UPDATE journals SET {} WHERE id = ?{}",
                updates.join(", "),
                params_vec.len() + 1
            );
            params_vec.push(Box::new(id));

            let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
            conn.execute(&sql, params_refs.as_slice())?;
        }

        Self::get_for_user(conn, user_id, id)
    }

    fn food_snapshot_id(entry: &Journal) -> DbResult<i64> {
        entry.item.journal_food_id().ok_or_else(|| {
            DbError::InvalidData(format!("Journal entry {} is not a logged food", entry.id))
        })
    }

    fn meal_snapshot_id(entry: &Journal) -> DbResult<i64> {
        entry.item.journal_meal_id().ok_or_else(|| {
            DbError::InvalidData(format!("Journal entry {} is not a logged meal", entry.id))
        })
    }

    /// Change the quantity of a logged food. Call inside a transaction.
    pub fn update_food_quantity(
        conn: &Connection,
        user_id: i64,
        id: i64,
        quantity: Decimal,
        name: Option<&str>,
    ) -> DbResult<Self> {
        let entry = Self::get_for_user(conn, user_id, id)?;
        let food_id = Self::food_snapshot_id(&entry)?;

        JournalFood::update_quantity(conn, food_id, quantity, name)?;
        Self::get_for_user(conn, user_id, id)
    }

    /// Add a food to a logged meal. Call inside a transaction.
    pub fn add_food_to_meal(
        conn: &Connection,
        user_id: i64,
        id: i64,
        food_id: i64,
        quantity: Decimal,
    ) -> DbResult<Self> {
        let entry = Self::get_for_user(conn, user_id, id)?;
        let meal_id = Self::meal_snapshot_id(&entry)?;
        let food = conn.food_by_id(food_id)?;

        JournalMeal::add_food(conn, meal_id, &food, quantity)?;
        Self::get_for_user(conn, user_id, id)
    }

    /// Change the quantity of one food of a logged meal. Call inside a transaction.
    pub fn update_meal_food(
        conn: &Connection,
        user_id: i64,
        id: i64,
        journal_meal_food_id: i64,
        quantity: Decimal,
        name: Option<&str>,
    ) -> DbResult<Self> {
        let entry = Self::get_for_user(conn, user_id, id)?;
        let meal_id = Self::meal_snapshot_id(&entry)?;

        JournalMeal::update_food(conn, meal_id, journal_meal_food_id, quantity, name)?;
        Self::get_for_user(conn, user_id, id)
    }

    /// Remove one food from a logged meal. Call inside a transaction.
    pub fn remove_meal_food(
        conn: &Connection,
        user_id: i64,
        id: i64,
        journal_meal_food_id: i64,
    ) -> DbResult<Self> {
        let entry = Self::get_for_user(conn, user_id, id)?;
        let meal_id = Self::meal_snapshot_id(&entry)?;

        JournalMeal::remove_food(conn, meal_id, journal_meal_food_id)?;
        Self::get_for_user(conn, user_id, id)
    }

    /// Delete an entry and its snapshot. Call inside a transaction.
    /// Returns Ok(false) if not found.
    pub fn delete(conn: &Connection, user_id: i64, id: i64) -> DbResult<bool> {
        let entry = match Self::get_for_user(conn, user_id, id) {
            Ok(entry) => entry,
            Err(DbError::RecordNotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        let rows = conn.execute("DELETE FROM journals WHERE id = ?1", [id])?;
        match entry.item {
            JournalItem::Food(food) => JournalFood::delete(conn, food.id)?,
            JournalItem::Meal(meal) => JournalMeal::delete(conn, meal.id)?,
        };
        Ok(rows > 0)
    }
}
