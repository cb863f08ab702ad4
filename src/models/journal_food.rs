//! Journal food snapshot model
//!
//! A food as it was when logged: values scaled to the consumed quantity and
//! its own copy of the portions.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{get_decimal, DbError, DbResult, SqlDecimal};
use crate::nutrition::{rebase, FoodSnapshot, PortionSnapshot};
use super::nutrition::{Nutrient, NutrientProfile, NUTRIENT_COLUMNS};

/// A portion copied into a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalPortion {
    pub id: i64,
    pub name: String,
    pub size: Decimal,
}

/// Snapshot of a logged food.
///
/// `profile.reference_quantity` is the consumed quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalFood {
    pub id: i64,
    pub name: String,
    pub profile: NutrientProfile,
    pub portions: Vec<JournalPortion>,
}

/// Insert a scaled profile into one of the snapshot tables, returning the new id.
///
/// `parent` is an optional `(column, id)` pair written alongside.
pub(crate) fn insert_snapshot_row(
    conn: &Connection,
    table: &str,
    parent: Option<(&str, i64)>,
    name: &str,
    profile: &NutrientProfile,
) -> DbResult<i64> {
    let values = profile.sql_values();
    let quantity = SqlDecimal(profile.reference_quantity);
    let parent_id = parent.map(|(_, id)| id).unwrap_or_default();

    let mut columns = vec!["name", "quantity", NUTRIENT_COLUMNS];
    let mut params_vec: Vec<&dyn rusqlite::ToSql> = vec![&name, &quantity];
    for value in &values {
        params_vec.push(value);
    }
    if let Some((column, _)) = parent {
        columns.push(column);
        params_vec.push(&parent_id);
    }

    let placeholders = (1..=params_vec.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_vec.as_slice())?;

    Ok(conn.last_insert_rowid())
}

/// Overwrite quantity and nutrients of a snapshot row
pub(crate) fn write_snapshot_profile(
    conn: &Connection,
    table: &str,
    id: i64,
    name: Option<&str>,
    profile: &NutrientProfile,
) -> DbResult<()> {
    let mut updates = vec!["quantity = ?1".to_string()];
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(SqlDecimal(profile.reference_quantity))];

    for (nutrient, value) in Nutrient::ALL.iter().zip(profile.sql_values()) {
        updates.push(format!("{} = ?{}", nutrient.as_str(), params_vec.len() + 1));
        params_vec.push(Box::new(value));
    }
    if let Some(name) = name {
        updates.push(format!("name = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(name.to_string()));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        table,
        updates.join(", "),
        params_vec.len() + 1
    );
    params_vec.push(Box::new(id));

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.execute(&sql, params_refs.as_slice())?;
    Ok(())
}

/// Copy portions into a snapshot portion table
pub(crate) fn insert_portions(
    conn: &Connection,
    table: &str,
    parent_column: &str,
    parent_id: i64,
    portions: &[PortionSnapshot],
) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO {} ({}, name, size) VALUES (?1, ?2, ?3)",
        table, parent_column
    );
    let mut stmt = conn.prepare(&sql)?;
    for portion in portions {
        stmt.execute(params![parent_id, portion.name, SqlDecimal(portion.size)])?;
    }
    Ok(())
}

/// Load the copied portions of a snapshot
pub(crate) fn load_portions(
    conn: &Connection,
    table: &str,
    parent_column: &str,
    parent_id: i64,
) -> DbResult<Vec<JournalPortion>> {
    let sql = format!(
        "SELECT id, name, size FROM {} WHERE {} = ?1 ORDER BY id",
        table, parent_column
    );
    let mut stmt = conn.prepare(&sql)?;

    let portions = stmt
        .query_map([parent_id], |row| {
            Ok(JournalPortion {
                id: row.get("id")?,
                name: row.get("name")?,
                size: get_decimal(row, "size")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(portions)
}

impl JournalFood {
    const TABLE: &'static str = "journal_foods";
    const PORTION_TABLE: &'static str = "journal_food_portions";
    const PARENT_COLUMN: &'static str = "journal_food_id";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            profile: NutrientProfile::from_row(row, "quantity")?,
            portions: Vec::new(),
        })
    }

    /// Persist a food snapshot with its portions
    pub fn create(conn: &Connection, snapshot: &FoodSnapshot) -> DbResult<Self> {
        let id = insert_snapshot_row(conn, Self::TABLE, None, &snapshot.name, &snapshot.profile)?;
        insert_portions(conn, Self::PORTION_TABLE, Self::PARENT_COLUMN, id, &snapshot.portions)?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a snapshot by ID, with portions
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM journal_foods WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(mut food) => {
                food.portions = load_portions(conn, Self::PORTION_TABLE, Self::PARENT_COLUMN, id)?;
                Ok(Some(food))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Change the consumed quantity by rebasing the stored values
    pub fn update_quantity(
        conn: &Connection,
        id: i64,
        quantity: Decimal,
        name: Option<&str>,
    ) -> DbResult<Option<Self>> {
        let current = match Self::get_by_id(conn, id)? {
            Some(food) => food,
            None => return Ok(None),
        };

        let profile = rebase(&current.profile, quantity)?;
        write_snapshot_profile(conn, Self::TABLE, id, name, &profile)?;

        Self::get_by_id(conn, id)
    }

    /// Delete a snapshot and its portions
    pub(crate) fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM journal_foods WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
