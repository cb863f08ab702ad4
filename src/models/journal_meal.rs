//! Journal meal snapshot model
//!
//! A meal as it was when logged. The stored totals are built with a full
//! recompute once and then maintained incrementally as single foods are
//! added, re-quantified or removed.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{
    add_child, rebase, remove_child, snapshot_meal_food, totals, CalcResult, CalculationError,
    FoodSnapshot, MealSnapshot,
};
use super::food::Food;
use super::journal_food::{
    insert_portions, insert_snapshot_row, load_portions, write_snapshot_profile, JournalPortion,
};
use super::nutrition::NutrientProfile;

/// One food of a journal meal, scaled to its quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalMealFood {
    pub id: i64,
    pub journal_meal_id: i64,
    pub name: String,
    pub profile: NutrientProfile,
    pub portions: Vec<JournalPortion>,
}

/// Snapshot of a logged meal.
///
/// `profile` holds the totals of `foods`; `saved` stays false until a journal
/// entry owns the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalMeal {
    pub id: i64,
    pub name: String,
    pub saved: bool,
    pub profile: NutrientProfile,
    pub foods: Vec<JournalMealFood>,
    pub created_at: String,
}

impl JournalMeal {
    const TABLE: &'static str = "journal_meals";
    const FOOD_TABLE: &'static str = "journal_meal_foods";
    const PORTION_TABLE: &'static str = "journal_meal_food_portions";
    const PORTION_PARENT: &'static str = "journal_meal_food_id";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let saved: i64 = row.get("saved")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            saved: saved != 0,
            profile: NutrientProfile::from_row(row, "quantity")?,
            foods: Vec::new(),
            created_at: row.get("created_at")?,
        })
    }

    /// Add a child to the set and its values to the totals
    pub fn attach(&mut self, child: JournalMealFood) -> CalcResult<()> {
        if self.foods.iter().any(|f| f.id == child.id) {
            return Err(CalculationError::ChildAlreadyPresent(child.id));
        }
        self.profile = add_child(&self.profile, &child.profile);
        self.foods.push(child);
        Ok(())
    }

    /// Remove a child from the set and its values from the totals
    pub fn detach(&mut self, child_id: i64) -> CalcResult<JournalMealFood> {
        let index = self
            .foods
            .iter()
            .position(|f| f.id == child_id)
            .ok_or(CalculationError::ChildNotPresent(child_id))?;
        let child = self.foods.remove(index);
        self.profile = remove_child(&self.profile, &child.profile);
        Ok(child)
    }

    /// Totals recomputed from the children, ignoring the stored ones
    pub fn recomputed_totals(&self) -> NutrientProfile {
        totals(self.foods.iter().map(|f| &f.profile))
    }

    fn insert_food(conn: &Connection, journal_meal_id: i64, snapshot: &FoodSnapshot) -> DbResult<i64> {
        let id = insert_snapshot_row(
            conn,
            Self::FOOD_TABLE,
            Some(("journal_meal_id", journal_meal_id)),
            &snapshot.name,
            &snapshot.profile,
        )?;
        insert_portions(conn, Self::PORTION_TABLE, Self::PORTION_PARENT, id, &snapshot.portions)?;
        Ok(id)
    }

    fn save_totals(conn: &Connection, meal: &JournalMeal) -> DbResult<()> {
        write_snapshot_profile(conn, Self::TABLE, meal.id, None, &meal.profile)?;
        conn.execute(
            "UPDATE journal_meals SET updated_at = datetime('now') WHERE id = ?1",
            [meal.id],
        )?;
        Ok(())
    }

    /// Persist a meal snapshot, unsaved. Call inside a transaction.
    pub fn create_unsaved(conn: &Connection, snapshot: &MealSnapshot) -> DbResult<Self> {
        let id = insert_snapshot_row(conn, Self::TABLE, None, &snapshot.name, &snapshot.profile)?;
        for food in &snapshot.foods {
            Self::insert_food(conn, id, food)?;
        }

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Flag the snapshot as owned by a committed journal entry
    pub fn mark_saved(conn: &Connection, id: i64) -> DbResult<()> {
        conn.execute("UPDATE journal_meals SET saved = 1 WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Get a snapshot by ID, with foods and their portions
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM journal_meals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(mut meal) => {
                meal.foods = JournalMealFood::list_for_meal(conn, id)?;
                Ok(Some(meal))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn require(conn: &Connection, id: i64) -> DbResult<Self> {
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::RecordNotFound(format!("Journal meal {} not found", id)))
    }

    /// Snapshot a food into the meal and add it to the totals
    pub fn add_food(conn: &Connection, id: i64, food: &Food, quantity: Decimal) -> DbResult<Self> {
        let mut meal = Self::require(conn, id)?;

        let snapshot = snapshot_meal_food(food, quantity)?;
        let child_id = Self::insert_food(conn, id, &snapshot)?;
        let child = JournalMealFood::get_by_id(conn, child_id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })?;

        meal.attach(child)?;
        Self::save_totals(conn, &meal)?;
        Ok(meal)
    }

    /// Rebase one food to a new quantity and adjust the totals
    pub fn update_food(
        conn: &Connection,
        id: i64,
        food_id: i64,
        quantity: Decimal,
        name: Option<&str>,
    ) -> DbResult<Self> {
        let mut meal = Self::require(conn, id)?;

        let mut child = meal.detach(food_id)?;
        child.profile = rebase(&child.profile, quantity)?;
        if let Some(name) = name {
            child.name = name.to_string();
        }
        write_snapshot_profile(conn, Self::FOOD_TABLE, food_id, name, &child.profile)?;

        meal.attach(child)?;
        Self::save_totals(conn, &meal)?;
        Ok(meal)
    }

    /// Remove one food and subtract it from the totals
    pub fn remove_food(conn: &Connection, id: i64, food_id: i64) -> DbResult<Self> {
        let mut meal = Self::require(conn, id)?;

        meal.detach(food_id)?;
        conn.execute("DELETE FROM journal_meal_foods WHERE id = ?1", [food_id])?;

        Self::save_totals(conn, &meal)?;
        Ok(meal)
    }

    /// Delete a snapshot and everything it owns
    pub(crate) fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM journal_meals WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Delete unsaved snapshots created more than `max_age_secs` ago.
    /// Returns the number removed.
    pub fn delete_unsaved_older_than(conn: &Connection, max_age_secs: u64) -> DbResult<usize> {
        let modifier = format!("-{} seconds", max_age_secs);
        let rows = conn.execute(
            "DELETE FROM journal_meals WHERE saved = 0 AND created_at < datetime('now', ?1)",
            params![modifier],
        )?;
        Ok(rows)
    }
}

impl JournalMealFood {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            journal_meal_id: row.get("journal_meal_id")?,
            name: row.get("name")?,
            profile: NutrientProfile::from_row(row, "quantity")?,
            portions: Vec::new(),
        })
    }

    fn with_portions(conn: &Connection, mut food: Self) -> DbResult<Self> {
        food.portions = load_portions(
            conn,
            JournalMeal::PORTION_TABLE,
            JournalMeal::PORTION_PARENT,
            food.id,
        )?;
        Ok(food)
    }

    /// Get one journal meal food, with portions
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM journal_meal_foods WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(food) => Ok(Some(Self::with_portions(conn, food)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_for_meal(conn: &Connection, journal_meal_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM journal_meal_foods WHERE journal_meal_id = ?1 ORDER BY id"
        )?;

        let foods = stmt
            .query_map([journal_meal_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        foods
            .into_iter()
            .map(|food| Self::with_portions(conn, food))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::models::{FoodCreate, Meal, MealCreate, Nutrient};
    use crate::nutrition::snapshot_meal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn food(conn: &Connection, name: &str, kilojoules: &str, fat: &str) -> Food {
        let data = FoodCreate {
            name: name.to_string(),
            nutrients: NutrientProfile {
                kilojoules: d(kilojoules),
                fat: d(fat),
                ..NutrientProfile::zero()
            },
        };
        Food::create(conn, &data).unwrap()
    }

    fn logged_meal(conn: &Connection) -> (JournalMeal, Food, Food) {
        let a = food(conn, "Pasta", "1500", "1.5");
        let b = food(conn, "Pesto", "2000", "45.33");
        let meal = Meal::create(
            conn,
            1,
            &MealCreate {
                name: "Pasta pesto".to_string(),
                food_ids: vec![a.id, b.id],
                quantity: d("80"),
            },
        )
        .unwrap();
        let snapshot = snapshot_meal(&meal).unwrap();
        (JournalMeal::create_unsaved(conn, &snapshot).unwrap(), a, b)
    }

    fn assert_totals_consistent(meal: &JournalMeal) {
        let full = meal.recomputed_totals();
        assert_eq!(meal.profile.reference_quantity, full.reference_quantity);
        for nutrient in Nutrient::ALL {
            assert_eq!(meal.profile.get(nutrient), full.get(nutrient), "{nutrient:?}");
        }
    }

    #[test]
    fn test_create_unsaved_stores_totals() {
        let conn = test_connection();
        let (meal, _, _) = logged_meal(&conn);

        assert!(!meal.saved);
        assert_eq!(meal.foods.len(), 2);
        assert_eq!(meal.foods[0].portions.len(), 2);
        assert_eq!(meal.profile.reference_quantity, d("160"));
        assert_eq!(meal.profile.kilojoules, d("2800.00"));
        assert_totals_consistent(&meal);
    }

    #[test]
    fn test_incremental_edits_match_recompute() {
        let conn = test_connection();
        let (meal, a, _) = logged_meal(&conn);

        let meal = JournalMeal::add_food(&conn, meal.id, &a, d("33")).unwrap();
        assert_eq!(meal.foods.len(), 3);
        assert_totals_consistent(&meal);

        let pesto = meal.foods[1].id;
        let meal = JournalMeal::update_food(&conn, meal.id, pesto, d("25"), Some("Basil pesto")).unwrap();
        assert_totals_consistent(&meal);

        let pasta = meal.foods.iter().find(|f| f.name == "Pasta").map(|f| f.id).unwrap();
        let meal = JournalMeal::remove_food(&conn, meal.id, pasta).unwrap();
        assert_eq!(meal.foods.len(), 2);
        assert_totals_consistent(&meal);

        let stored = JournalMeal::get_by_id(&conn, meal.id).unwrap().unwrap();
        assert_eq!(stored.profile, meal.profile);
        assert_totals_consistent(&stored);
        assert!(stored.foods.iter().any(|f| f.name == "Basil pesto"));
    }

    #[test]
    fn test_double_attach_and_detach_are_rejected() {
        let conn = test_connection();
        let (mut meal, _, _) = logged_meal(&conn);
        let before = meal.profile.clone();

        let child = meal.foods[0].clone();
        assert_eq!(meal.attach(child.clone()), Err(CalculationError::ChildAlreadyPresent(child.id)));
        assert_eq!(meal.profile, before);

        meal.detach(child.id).unwrap();
        assert_eq!(meal.detach(child.id), Err(CalculationError::ChildNotPresent(child.id)));

        meal.attach(child).unwrap();
        assert_eq!(meal.profile, before);
    }

    #[test]
    fn test_removing_unknown_food_fails() {
        let conn = test_connection();
        let (meal, _, _) = logged_meal(&conn);

        let result = JournalMeal::remove_food(&conn, meal.id, 9999);
        assert!(matches!(
            result,
            Err(DbError::Calculation(CalculationError::ChildNotPresent(9999)))
        ));
    }

    #[test]
    fn test_sweep_only_removes_old_unsaved() {
        let conn = test_connection();
        let (old_unsaved, _, _) = logged_meal(&conn);
        let (old_saved, _, _) = logged_meal(&conn);
        let (fresh_unsaved, _, _) = logged_meal(&conn);

        JournalMeal::mark_saved(&conn, old_saved.id).unwrap();
        conn.execute(
            "UPDATE journal_meals SET created_at = '2000-01-01 00:00:00' WHERE id IN (?1, ?2)",
            params![old_unsaved.id, old_saved.id],
        )
        .unwrap();

        let removed = JournalMeal::delete_unsaved_older_than(&conn, 3600).unwrap();
        assert_eq!(removed, 1);
        assert!(JournalMeal::get_by_id(&conn, old_unsaved.id).unwrap().is_none());
        assert!(JournalMeal::get_by_id(&conn, old_saved.id).unwrap().unwrap().saved);
        assert!(JournalMeal::get_by_id(&conn, fresh_unsaved.id).unwrap().is_some());

        let orphans: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM journal_meal_foods WHERE journal_meal_id = ?1",
                [old_unsaved.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
