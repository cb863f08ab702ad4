//! Database module
//!
//! Handles SQLite connection, decimal columns and migrations.

pub mod connection;
pub mod decimal;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};
pub use decimal::{get_decimal, SqlDecimal};

/// Open an in-memory database with the current schema, for tests
#[cfg(test)]
pub fn test_connection() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().expect("in-memory database");
    conn.execute_batch("PRAGMA foreign_keys = ON;").expect("foreign keys");
    migrations::run_migrations(&conn).expect("migrations");
    conn
}

/// Open a pooled database backed by a private shared in-memory SQLite, for tests
#[cfg(test)]
pub fn test_database() -> Database {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, Ordering::SeqCst);
    let uri = format!("file:kj_test_{}_{}?mode=memory&cache=shared", std::process::id(), n);

    let db = Database::new(uri).expect("test database");
    db.with_conn(|conn| migrations::run_migrations(conn)).expect("migrations");
    db
}
