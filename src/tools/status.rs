//! Status Tool
//!
//! Runtime status of the service and usage notes for assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildStamp;
use crate::db::{Database, DbResult};

/// Journal logging instructions for AI assistants
pub const JOURNAL_INSTRUCTIONS: &str = r#"
# Kilojoules Journal Instructions

## Foods

Foods store nutrient values per 100 g. Every food gets two protected portions,
"1 g" and "100 g", which cannot be deleted. Up to 9 portions per food.

Energy is in kilojoules. Cholesterol, sodium, calcium and phenylalanine (phe)
are in milligrams; everything else is in grams.

## Quantities

Quantities are always `multiplier × portion size`:
- `log_food` with `portion_id` of a "30 g slice" and `multiplier` 2 logs 60 g
- without `portion_id` the multiplier is taken as grams

## Meals

A meal is a reusable list of foods at fixed quantities. Its totals are always
recomputed from the current food values.

## Journal

Logging copies the food or meal into the journal. Later edits to the food or
meal never change past entries. Edit a journal entry with `update_journal_food`,
`add_food_to_journal_meal`, `update_journal_meal_food` and
`remove_journal_meal_food`.

Meal types: BREAKFAST, MID_MORNING_SNACK, LUNCH, AFTERNOON_SNACK, DINNER.
Dates use ISO format: YYYY-MM-DD.

## Statistics

`get_statistics` returns totals, per-day averages and the top 10 entries for
kilojoules, proteins, carbohydrates, fiber and fat. Merged rankings add up
entries with the same name.
"#;

/// Row counts of the main tables
#[derive(Debug, Clone, Serialize)]
pub struct RecordCounts {
    pub foods: i64,
    pub meals: i64,
    pub journal_entries: i64,
    pub unsaved_journal_meals: i64,
}

impl RecordCounts {
    fn load(db: &Database) -> DbResult<Self> {
        db.with_conn(|conn| {
            let count = |sql: &str| -> DbResult<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };
            Ok(Self {
                foods: count("SELECT COUNT(*) FROM foods")?,
                meals: count("SELECT COUNT(*) FROM meals")?,
                journal_entries: count("SELECT COUNT(*) FROM journals")?,
                unsaved_journal_meals: count("SELECT COUNT(*) FROM journal_meals WHERE saved = 0")?,
            })
        })
    }
}

/// Runtime status of the service
#[derive(Debug, Clone, Serialize)]
pub struct KilojoulesStatus {
    #[serde(flatten)]
    pub build: BuildStamp,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub records: Option<RecordCounts>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> KilojoulesStatus {
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let records = match RecordCounts::load(db) {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::warn!("status: could not count records: {}", e);
                None
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        KilojoulesStatus {
            build: BuildStamp::CURRENT,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            records,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
