//! One-off sweep of journal meal snapshots that never got a journal entry
//! Usage: cargo run --bin sweep_journal_meals -- [max_age_secs]

use kilojoules::config::Config;
use kilojoules::db::{migrations, Database};
use kilojoules::models::JournalMeal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    let max_age_secs = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<u64>()?,
        None => config.sweep_interval_secs,
    };

    let db_path = &config.database_path;
    println!("Database: {}", db_path.display());

    let database = Database::new(db_path)?;

    let removed = database.with_transaction(|tx| {
        migrations::run_migrations(tx)?;
        JournalMeal::delete_unsaved_older_than(tx, max_age_secs)
    })?;

    println!(
        "Removed {} unsaved journal meal(s) older than {} seconds",
        removed, max_age_secs
    );
    Ok(())
}
