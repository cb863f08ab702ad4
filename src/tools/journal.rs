//! Journal Tools
//!
//! Tools for logging foods and meals into the dated journal and editing
//! logged entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{db_error, parse_date, parse_meal_type, quantity, to_decimal, validate_name};
use crate::db::{Database, DbError, DbResult};
use crate::models::{
    limits, FoodLookup, Journal, JournalFoodCreate, JournalItem, JournalMeal, JournalMealCreate,
    JournalPortion, JournalUpdate,
};
use crate::nutrition::{daily_totals, JournalTotals};

/// A day of journal entries with its totals
#[derive(Debug, Serialize)]
pub struct JournalDayResponse {
    pub date: NaiveDate,
    pub entries: Vec<Journal>,
    pub totals: JournalTotals,
}

#[derive(Debug, Serialize)]
pub struct DeleteEntryResponse {
    pub success: bool,
    pub deleted_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub removed: usize,
}

/// Size of the chosen portion, or 1 g when none is chosen
fn portion_size<I>(portions: I, portion_id: Option<i64>) -> DbResult<Decimal>
where
    I: IntoIterator<Item = (i64, Decimal)>,
{
    let Some(portion_id) = portion_id else {
        return Ok(Decimal::ONE);
    };
    portions
        .into_iter()
        .find(|(id, _)| *id == portion_id)
        .map(|(_, size)| size)
        .ok_or_else(|| DbError::RecordNotFound(format!("Portion {} not found", portion_id)))
}

fn snapshot_portions(portions: &[JournalPortion]) -> Vec<(i64, Decimal)> {
    portions.iter().map(|p| (p.id, p.size)).collect()
}

fn display_name(name: Option<&str>) -> Result<Option<String>, String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| validate_name("Food", n, limits::FOOD_NAME))
        .transpose()
}

/// Log a food: multiplier × portion size grams, copied into the journal
#[allow(clippy::too_many_arguments)]
pub fn log_food(
    db: &Database,
    user_id: i64,
    date: &str,
    meal_type: &str,
    food_id: i64,
    multiplier: f64,
    portion_id: Option<i64>,
    name: Option<&str>,
) -> Result<Journal, String> {
    let consumed_at = parse_date(date)?;
    let meal_type = parse_meal_type(meal_type)?;
    let multiplier = to_decimal("multiplier", multiplier)?;
    let name = display_name(name)?;

    let entry = db
        .with_transaction(|tx| {
            let food = tx.food_by_id(food_id)?;
            let size = portion_size(food.portions.iter().map(|p| (p.id, p.size)), portion_id)?;
            let data = JournalFoodCreate {
                consumed_at,
                meal_type,
                food_id,
                quantity: quantity(multiplier, size),
                name,
            };
            Journal::log_food(tx, user_id, &data)
        })
        .map_err(|e| db_error("log food", e))?;

    tracing::info!(
        user_id,
        journal_id = entry.id,
        "logged food '{}' for {} {}",
        entry.item.name(),
        entry.consumed_at,
        entry.meal_type.as_str()
    );
    Ok(entry)
}

/// Log one of the user's meals, copied into the journal
pub fn log_meal(
    db: &Database,
    user_id: i64,
    date: &str,
    meal_type: &str,
    meal_id: i64,
) -> Result<Journal, String> {
    let data = JournalMealCreate {
        consumed_at: parse_date(date)?,
        meal_type: parse_meal_type(meal_type)?,
        meal_id,
    };

    let entry = db
        .with_transaction(|tx| Journal::log_meal(tx, user_id, &data))
        .map_err(|e| db_error("log meal", e))?;

    tracing::info!(
        user_id,
        journal_id = entry.id,
        "logged meal '{}' for {} {}",
        entry.item.name(),
        entry.consumed_at,
        entry.meal_type.as_str()
    );
    Ok(entry)
}

/// Get one journal entry
pub fn get_journal_entry(db: &Database, user_id: i64, id: i64) -> Result<Journal, String> {
    tracing::debug!(user_id, journal_id = id, "get journal entry");
    db.with_conn(|conn| Journal::get_for_user(conn, user_id, id))
        .map_err(|e| db_error("get journal entry", e))
}

/// All entries of a day, ordered by meal type, with the day's totals
pub fn get_journal_day(db: &Database, user_id: i64, date: &str) -> Result<JournalDayResponse, String> {
    let date = parse_date(date)?;
    tracing::debug!(user_id, %date, "get journal day");

    let entries = db
        .with_conn(|conn| Journal::list_for_day(conn, user_id, date))
        .map_err(|e| db_error("get journal day", e))?;

    let totals = daily_totals(&entries, date);
    Ok(JournalDayResponse { date, entries, totals })
}

/// Move an entry to another date or meal type
pub fn update_journal_entry(
    db: &Database,
    user_id: i64,
    id: i64,
    date: Option<&str>,
    meal_type: Option<&str>,
) -> Result<Journal, String> {
    let data = JournalUpdate {
        consumed_at: date.map(parse_date).transpose()?,
        meal_type: meal_type.map(parse_meal_type).transpose()?,
    };

    let entry = db
        .with_transaction(|tx| Journal::update(tx, user_id, id, &data))
        .map_err(|e| db_error("update journal entry", e))?;

    tracing::info!(user_id, journal_id = id, "moved journal entry");
    Ok(entry)
}

/// Change the quantity (and optionally the name) of a logged food.
/// The portion is one of the snapshot's portions.
pub fn update_journal_food(
    db: &Database,
    user_id: i64,
    id: i64,
    multiplier: f64,
    portion_id: Option<i64>,
    name: Option<&str>,
) -> Result<Journal, String> {
    let multiplier = to_decimal("multiplier", multiplier)?;
    let name = display_name(name)?;

    let entry = db
        .with_transaction(|tx| {
            let entry = Journal::get_for_user(tx, user_id, id)?;
            let portions = match &entry.item {
                JournalItem::Food(food) => snapshot_portions(&food.portions),
                JournalItem::Meal(_) => Vec::new(),
            };
            let size = portion_size(portions, portion_id)?;
            Journal::update_food_quantity(tx, user_id, id, quantity(multiplier, size), name.as_deref())
        })
        .map_err(|e| db_error("update journal food", e))?;

    tracing::info!(user_id, journal_id = id, "updated journal food");
    Ok(entry)
}

/// Add a food to a logged meal
pub fn add_food_to_journal_meal(
    db: &Database,
    user_id: i64,
    id: i64,
    food_id: i64,
    multiplier: f64,
    portion_id: Option<i64>,
) -> Result<Journal, String> {
    let multiplier = to_decimal("multiplier", multiplier)?;

    let entry = db
        .with_transaction(|tx| {
            let food = tx.food_by_id(food_id)?;
            let size = portion_size(food.portions.iter().map(|p| (p.id, p.size)), portion_id)?;
            Journal::add_food_to_meal(tx, user_id, id, food_id, quantity(multiplier, size))
        })
        .map_err(|e| db_error("add food to journal meal", e))?;

    tracing::info!(user_id, journal_id = id, food_id, "added food to journal meal");
    Ok(entry)
}

/// Change the quantity (and optionally the name) of one food of a logged meal
pub fn update_journal_meal_food(
    db: &Database,
    user_id: i64,
    id: i64,
    journal_meal_food_id: i64,
    multiplier: f64,
    portion_id: Option<i64>,
    name: Option<&str>,
) -> Result<Journal, String> {
    let multiplier = to_decimal("multiplier", multiplier)?;
    let name = display_name(name)?;

    let entry = db
        .with_transaction(|tx| {
            let entry = Journal::get_for_user(tx, user_id, id)?;
            let portions = match &entry.item {
                JournalItem::Meal(meal) => meal
                    .foods
                    .iter()
                    .find(|f| f.id == journal_meal_food_id)
                    .map(|f| snapshot_portions(&f.portions))
                    .unwrap_or_default(),
                JournalItem::Food(_) => Vec::new(),
            };
            let size = portion_size(portions, portion_id)?;
            Journal::update_meal_food(
                tx,
                user_id,
                id,
                journal_meal_food_id,
                quantity(multiplier, size),
                name.as_deref(),
            )
        })
        .map_err(|e| db_error("update journal meal food", e))?;

    tracing::info!(user_id, journal_id = id, journal_meal_food_id, "updated journal meal food");
    Ok(entry)
}

/// Remove one food from a logged meal
pub fn remove_journal_meal_food(
    db: &Database,
    user_id: i64,
    id: i64,
    journal_meal_food_id: i64,
) -> Result<Journal, String> {
    let entry = db
        .with_transaction(|tx| Journal::remove_meal_food(tx, user_id, id, journal_meal_food_id))
        .map_err(|e| db_error("remove journal meal food", e))?;

    tracing::info!(user_id, journal_id = id, journal_meal_food_id, "removed food from journal meal");
    Ok(entry)
}

/// Delete a journal entry and its snapshot
pub fn delete_journal_entry(db: &Database, user_id: i64, id: i64) -> Result<DeleteEntryResponse, String> {
    let deleted = db
        .with_transaction(|tx| Journal::delete(tx, user_id, id))
        .map_err(|e| db_error("delete journal entry", e))?;

    if !deleted {
        return Err(format!("Journal entry not found with id: {}", id));
    }
    tracing::info!(user_id, journal_id = id, "deleted journal entry");
    Ok(DeleteEntryResponse { success: true, deleted_id: id })
}

/// Remove journal meal snapshots that never got an entry
pub fn sweep_unsaved_meals(db: &Database, max_age_secs: u64) -> Result<SweepResponse, String> {
    let removed = db
        .with_transaction(|tx| JournalMeal::delete_unsaved_older_than(tx, max_age_secs))
        .map_err(|e| db_error("sweep journal meals", e))?;

    if removed > 0 {
        tracing::info!(removed, "swept unsaved journal meals");
    } else {
        tracing::debug!("no unsaved journal meals to sweep");
    }
    Ok(SweepResponse { removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use crate::models::MealType;
    use crate::tools::foods::{add_food, add_portion, NutrientInput};
    use crate::tools::meals::create_meal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn food(db: &Database, name: &str, kilojoules: f64) -> i64 {
        let nutrients = NutrientInput {
            kilojoules: Some(kilojoules),
            proteins: Some(10.0),
            ..Default::default()
        };
        add_food(db, name, &nutrients).unwrap().id
    }

    #[test]
    fn test_log_food_with_portion() {
        let db = test_database();
        let bread = food(&db, "Bread", 1000.0);
        let slice = add_portion(&db, bread, "1 slice", 30.0).unwrap();

        let entry = log_food(&db, 1, "2025-03-01", "breakfast", bread, 2.0, Some(slice.id), None).unwrap();
        assert_eq!(entry.meal_type, MealType::Breakfast);
        assert_eq!(entry.item.profile().reference_quantity, d("60"));
        assert_eq!(entry.item.profile().kilojoules, d("600.00"));

        // without a portion the multiplier is grams
        let entry = log_food(&db, 1, "2025-03-01", "LUNCH", bread, 15.0, None, Some("Toast")).unwrap();
        assert_eq!(entry.item.name(), "Toast");
        assert_eq!(entry.item.profile().kilojoules, d("150.00"));
    }

    #[test]
    fn test_log_food_rejects_bad_input() {
        let db = test_database();
        let bread = food(&db, "Bread", 1000.0);

        assert!(log_food(&db, 1, "2025-13-01", "LUNCH", bread, 1.0, None, None).is_err());
        assert!(log_food(&db, 1, "2025-03-01", "BRUNCH", bread, 1.0, None, None).is_err());
        assert!(log_food(&db, 1, "2025-03-01", "LUNCH", 999, 1.0, None, None).is_err());
        assert!(log_food(&db, 1, "2025-03-01", "LUNCH", bread, 1.0, Some(999), None).is_err());
        assert!(get_journal_day(&db, 1, "2025-03-01").unwrap().entries.is_empty());
    }

    #[test]
    fn test_huge_quantities_are_rejected() {
        let db = test_database();
        let nutrients = NutrientInput {
            kilojoules: Some(1e20),
            ..Default::default()
        };
        assert!(add_food(&db, "Lead", &nutrients).is_err());

        let dense = food(&db, "Dense", 1e9);
        assert!(log_food(&db, 1, "2025-03-01", "LUNCH", dense, 1e10, None, None).is_err());

        let entry = log_food(&db, 1, "2025-03-01", "LUNCH", dense, 1e9, None, None).unwrap();
        assert_eq!(entry.item.profile().kilojoules, d("10000000000000000"));
    }

    #[test]
    fn test_journal_day_and_edits() {
        let db = test_database();
        let soup = food(&db, "Soup", 50.0);

        let entry = log_food(&db, 1, "2025-03-01", "DINNER", soup, 100.0, None, None).unwrap();
        let edited = update_journal_food(&db, 1, entry.id, 200.0, None, None).unwrap();
        assert_eq!(edited.item.profile().kilojoules, d("100.00"));

        let portion_id = match &edited.item {
            JournalItem::Food(f) => f.portions.iter().find(|p| p.name == "100 g").unwrap().id,
            JournalItem::Meal(_) => panic!("expected a food entry"),
        };
        let edited = update_journal_food(&db, 1, entry.id, 1.0, Some(portion_id), Some("Tomato soup")).unwrap();
        assert_eq!(edited.item.profile().kilojoules, d("50.00"));
        assert_eq!(edited.item.name(), "Tomato soup");

        let day = get_journal_day(&db, 1, "2025-03-01").unwrap();
        assert_eq!(day.entries.len(), 1);
        assert_eq!(day.totals.kilojoules, d("50.00"));

        let moved = update_journal_entry(&db, 1, entry.id, Some("2025-03-02"), Some("LUNCH")).unwrap();
        assert_eq!(moved.meal_type, MealType::Lunch);
        assert!(get_journal_day(&db, 1, "2025-03-01").unwrap().entries.is_empty());

        assert!(get_journal_entry(&db, 2, entry.id).is_err());
        assert!(delete_journal_entry(&db, 1, entry.id).unwrap().success);
        assert!(delete_journal_entry(&db, 1, entry.id).is_err());
    }

    #[test]
    fn test_journal_meal_edits() {
        let db = test_database();
        let a = food(&db, "A", 200.0);
        let b = food(&db, "B", 100.0);
        let meal = create_meal(&db, 1, "Bowl", vec![a], 1.0, 50.0).unwrap();

        let entry = log_meal(&db, 1, "2025-03-02", "LUNCH", meal.id).unwrap();
        assert_eq!(entry.item.profile().kilojoules, d("100.00"));
        assert!(log_meal(&db, 2, "2025-03-02", "LUNCH", meal.id).is_err());

        let entry = add_food_to_journal_meal(&db, 1, entry.id, b, 100.0, None).unwrap();
        assert_eq!(entry.item.profile().kilojoules, d("200.00"));

        let JournalItem::Meal(snapshot) = &entry.item else {
            panic!("expected a meal entry");
        };
        let first = snapshot.foods[0].id;
        let entry = update_journal_meal_food(&db, 1, entry.id, first, 100.0, None, None).unwrap();
        assert_eq!(entry.item.profile().kilojoules, d("300.00"));

        let entry = remove_journal_meal_food(&db, 1, entry.id, first).unwrap();
        assert_eq!(entry.item.profile().kilojoules, d("100.00"));
        assert!(remove_journal_meal_food(&db, 1, entry.id, first).is_err());
    }

    #[test]
    fn test_sweep_keeps_saved_meals() {
        let db = test_database();
        let a = food(&db, "A", 200.0);
        let meal = create_meal(&db, 1, "Bowl", vec![a], 1.0, 50.0).unwrap();
        log_meal(&db, 1, "2025-03-02", "LUNCH", meal.id).unwrap();

        assert_eq!(sweep_unsaved_meals(&db, 0).unwrap().removed, 0);
    }
}
