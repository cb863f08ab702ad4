//! Kilojoules
//!
//! An MCP server for food, meal and nutrition journal tracking.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use kilojoules::config::Config;
use kilojoules::db::{self, Database};
use kilojoules::mcp::KilojoulesService;
use kilojoules::{build_info, tools};

/// Periodically remove journal meal snapshots that never got an entry
fn spawn_sweeper(database: Database, config: &Config) {
    let interval = config.sweep_interval();
    let max_age_secs = config.sweep_interval_secs;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let db = database.clone();
            let result = tokio::task::spawn_blocking(move || {
                tools::journal::sweep_unsaved_meals(&db, max_age_secs)
            })
            .await;

            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("journal meal sweep failed: {}", e),
                Err(e) => tracing::error!("journal meal sweep panicked: {}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kilojoules=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = Database::new(&db_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    tracing::info!(interval_secs = config.sweep_interval_secs, "starting journal meal sweeper");
    spawn_sweeper(database.clone(), &config);

    let service = KilojoulesService::new(db_path, database);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
