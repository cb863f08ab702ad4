//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
///
/// Nutrient columns are TEXT holding exact decimal strings.
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- FOODS
        -- Reference nutrient profile, per `quantity` (100 g)
        -- ============================================
        CREATE TABLE foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            quantity TEXT NOT NULL DEFAULT '100',   -- reference basis, immutable

            kilojoules TEXT NOT NULL DEFAULT '0',
            proteins TEXT NOT NULL DEFAULT '0',
            carbohydrates TEXT NOT NULL DEFAULT '0',
            fiber TEXT NOT NULL DEFAULT '0',
            sugar TEXT NOT NULL DEFAULT '0',
            fat TEXT NOT NULL DEFAULT '0',
            safa TEXT NOT NULL DEFAULT '0',
            tfa TEXT NOT NULL DEFAULT '0',
            cholesterol TEXT NOT NULL DEFAULT '0',
            sodium TEXT NOT NULL DEFAULT '0',
            calcium TEXT NOT NULL DEFAULT '0',
            phe TEXT NOT NULL DEFAULT '0',

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_foods_name ON foods(name);

        -- ============================================
        -- PORTIONS
        -- Named real-world units of a food ("1 slice" = 30 g)
        -- ============================================
        CREATE TABLE portions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_id INTEGER NOT NULL REFERENCES foods(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            size TEXT NOT NULL,

            UNIQUE(food_id, name)
        );

        CREATE INDEX idx_portions_food ON portions(food_id);

        -- ============================================
        -- MEALS
        -- Compositions of foods; totals are derived on read
        -- ============================================
        CREATE TABLE meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meals_user ON meals(user_id);

        CREATE TABLE meal_foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
            food_id INTEGER NOT NULL REFERENCES foods(id) ON DELETE RESTRICT,
            quantity TEXT NOT NULL                  -- absolute grams
        );

        CREATE INDEX idx_meal_foods_meal ON meal_foods(meal_id);
        CREATE INDEX idx_meal_foods_food ON meal_foods(food_id);

        -- ============================================
        -- JOURNAL FOOD SNAPSHOTS
        -- Values already scaled to `quantity`
        -- ============================================
        CREATE TABLE journal_foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            quantity TEXT NOT NULL,

            kilojoules TEXT NOT NULL DEFAULT '0',
            proteins TEXT NOT NULL DEFAULT '0',
            carbohydrates TEXT NOT NULL DEFAULT '0',
            fiber TEXT NOT NULL DEFAULT '0',
            sugar TEXT NOT NULL DEFAULT '0',
            fat TEXT NOT NULL DEFAULT '0',
            safa TEXT NOT NULL DEFAULT '0',
            tfa TEXT NOT NULL DEFAULT '0',
            cholesterol TEXT NOT NULL DEFAULT '0',
            sodium TEXT NOT NULL DEFAULT '0',
            calcium TEXT NOT NULL DEFAULT '0',
            phe TEXT NOT NULL DEFAULT '0',

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE journal_food_portions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            journal_food_id INTEGER NOT NULL REFERENCES journal_foods(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            size TEXT NOT NULL
        );

        CREATE INDEX idx_journal_food_portions_parent ON journal_food_portions(journal_food_id);

        -- ============================================
        -- JOURNAL MEAL SNAPSHOTS
        -- Totals maintained from the owned journal_meal_foods
        -- ============================================
        CREATE TABLE journal_meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            saved INTEGER NOT NULL DEFAULT 0,       -- 0 until a journal entry owns it
            quantity TEXT NOT NULL DEFAULT '0',

            kilojoules TEXT NOT NULL DEFAULT '0',
            proteins TEXT NOT NULL DEFAULT '0',
            carbohydrates TEXT NOT NULL DEFAULT '0',
            fiber TEXT NOT NULL DEFAULT '0',
            sugar TEXT NOT NULL DEFAULT '0',
            fat TEXT NOT NULL DEFAULT '0',
            safa TEXT NOT NULL DEFAULT '0',
            tfa TEXT NOT NULL DEFAULT '0',
            cholesterol TEXT NOT NULL DEFAULT '0',
            sodium TEXT NOT NULL DEFAULT '0',
            calcium TEXT NOT NULL DEFAULT '0',
            phe TEXT NOT NULL DEFAULT '0',

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_journal_meals_saved ON journal_meals(saved, created_at);

        CREATE TABLE journal_meal_foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            journal_meal_id INTEGER NOT NULL REFERENCES journal_meals(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            quantity TEXT NOT NULL,

            kilojoules TEXT NOT NULL DEFAULT '0',
            proteins TEXT NOT NULL DEFAULT '0',
            carbohydrates TEXT NOT NULL DEFAULT '0',
            fiber TEXT NOT NULL DEFAULT '0',
            sugar TEXT NOT NULL DEFAULT '0',
            fat TEXT NOT NULL DEFAULT '0',
            safa TEXT NOT NULL DEFAULT '0',
            tfa TEXT NOT NULL DEFAULT '0',
            cholesterol TEXT NOT NULL DEFAULT '0',
            sodium TEXT NOT NULL DEFAULT '0',
            calcium TEXT NOT NULL DEFAULT '0',
            phe TEXT NOT NULL DEFAULT '0'
        );

        CREATE INDEX idx_journal_meal_foods_parent ON journal_meal_foods(journal_meal_id);

        CREATE TABLE journal_meal_food_portions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            journal_meal_food_id INTEGER NOT NULL REFERENCES journal_meal_foods(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            size TEXT NOT NULL
        );

        CREATE INDEX idx_journal_meal_food_portions_parent ON journal_meal_food_portions(journal_meal_food_id);

        -- ============================================
        -- JOURNALS
        -- One dated, meal-typed entry per logged food or meal
        -- ============================================
        CREATE TABLE journals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            consumed_at TEXT NOT NULL,              -- ISO date: "2025-01-09"
            meal_type INTEGER NOT NULL CHECK(meal_type BETWEEN 0 AND 4),

            journal_food_id INTEGER UNIQUE REFERENCES journal_foods(id) ON DELETE RESTRICT,
            journal_meal_id INTEGER UNIQUE REFERENCES journal_meals(id) ON DELETE RESTRICT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            -- Constraint: exactly one snapshot
            CHECK ((journal_food_id IS NOT NULL AND journal_meal_id IS NULL) OR
                   (journal_food_id IS NULL AND journal_meal_id IS NOT NULL))
        );

        CREATE INDEX idx_journals_user_date ON journals(user_id, consumed_at);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }
}
