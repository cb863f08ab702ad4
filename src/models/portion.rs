//! Portion model
//!
//! Named real-world units of a food, e.g. "1 slice" = 30 g.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{get_decimal, DbError, DbResult, SqlDecimal};

/// Maximum number of portions per food
pub const MAX_PORTIONS: i64 = 9;

/// Maximum portion name length
pub const MAX_NAME_LEN: usize = 55;

/// Portions created with every food; they cannot be deleted
pub const PROTECTED_PORTIONS: [(&str, i64); 2] = [("1 g", 1), ("100 g", 100)];

/// A portion of a food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub id: i64,
    pub food_id: i64,
    pub name: String,
    pub size: Decimal,
}

/// Data for creating a portion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortionCreate {
    pub name: String,
    pub size: Decimal,
}

impl Portion {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            food_id: row.get("food_id")?,
            name: row.get("name")?,
            size: get_decimal(row, "size")?,
        })
    }

    pub fn is_protected(&self) -> bool {
        PROTECTED_PORTIONS.iter().any(|(name, _)| *name == self.name)
    }

    /// Insert the "1 g" and "100 g" portions for a new food
    pub(crate) fn create_protected(conn: &Connection, food_id: i64) -> DbResult<()> {
        for (name, size) in PROTECTED_PORTIONS {
            conn.execute(
                "INSERT INTO portions (food_id, name, size) VALUES (?1, ?2, ?3)",
                params![food_id, name, SqlDecimal(Decimal::from(size))],
            )?;
        }
        Ok(())
    }

    /// Add a portion to a food.
    ///
    /// Rejects a tenth portion before the duplicate name check.
    pub fn create(conn: &Connection, food_id: i64, data: &PortionCreate) -> DbResult<Self> {
        let food_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM foods WHERE id = ?1)",
            [food_id],
            |row| row.get(0),
        )?;
        if !food_exists {
            return Err(DbError::RecordNotFound(format!("Food {} not found", food_id)));
        }

        if Self::count_for_food(conn, food_id)? >= MAX_PORTIONS {
            return Err(DbError::RecordCountExceeded(format!(
                "A food can have at most {} portions",
                MAX_PORTIONS
            )));
        }

        let name = data.name.trim();
        let name_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM portions WHERE food_id = ?1 AND name = ?2)",
            params![food_id, name],
            |row| row.get(0),
        )?;
        if name_taken {
            return Err(DbError::RecordNameExists(format!(
                "Portion '{}' already exists for this food",
                name
            )));
        }

        conn.execute(
            "INSERT INTO portions (food_id, name, size) VALUES (?1, ?2, ?3)",
            params![food_id, name, SqlDecimal(data.size)],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a portion by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM portions WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(portion) => Ok(Some(portion)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All portions of a food, in creation order
    pub fn list_for_food(conn: &Connection, food_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM portions WHERE food_id = ?1 ORDER BY id")?;

        let portions = stmt
            .query_map([food_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(portions)
    }

    pub fn count_for_food(conn: &Connection, food_id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM portions WHERE food_id = ?1",
            [food_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a portion of the given food.
    /// Returns Ok(false) if the portion does not belong to the food.
    pub fn delete(conn: &Connection, food_id: i64, id: i64) -> DbResult<bool> {
        let portion = match Self::get_by_id(conn, id)? {
            Some(p) if p.food_id == food_id => p,
            _ => return Ok(false),
        };

        if portion.is_protected() {
            return Err(DbError::RecordNotDeletable(format!(
                "Portion '{}' cannot be deleted",
                portion.name
            )));
        }

        let rows = conn.execute("DELETE FROM portions WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::models::{Food, FoodCreate, NutrientProfile};

    fn food_id(conn: &Connection) -> i64 {
        let data = FoodCreate {
            name: "Bread".to_string(),
            nutrients: NutrientProfile::zero(),
        };
        Food::create(conn, &data).unwrap().id
    }

    fn portion(name: &str, size: i64) -> PortionCreate {
        PortionCreate {
            name: name.to_string(),
            size: Decimal::from(size),
        }
    }

    #[test]
    fn test_tenth_portion_is_rejected() {
        let conn = test_connection();
        let food_id = food_id(&conn);

        for i in 0..7 {
            Portion::create(&conn, food_id, &portion(&format!("{} slices", i + 1), 30 * (i + 1))).unwrap();
        }
        assert_eq!(Portion::count_for_food(&conn, food_id).unwrap(), MAX_PORTIONS);

        let result = Portion::create(&conn, food_id, &portion("loaf", 500));
        assert!(matches!(result, Err(DbError::RecordCountExceeded(_))));
        assert_eq!(Portion::count_for_food(&conn, food_id).unwrap(), MAX_PORTIONS);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let conn = test_connection();
        let food_id = food_id(&conn);

        Portion::create(&conn, food_id, &portion("1 slice", 30)).unwrap();
        let result = Portion::create(&conn, food_id, &portion("1 slice", 35));
        assert!(matches!(result, Err(DbError::RecordNameExists(_))));

        let result = Portion::create(&conn, food_id, &portion("100 g", 100));
        assert!(matches!(result, Err(DbError::RecordNameExists(_))));
    }

    #[test]
    fn test_protected_portions_cannot_be_deleted() {
        let conn = test_connection();
        let food_id = food_id(&conn);

        for p in Portion::list_for_food(&conn, food_id).unwrap() {
            let result = Portion::delete(&conn, food_id, p.id);
            assert!(matches!(result, Err(DbError::RecordNotDeletable(_))));
        }

        let slice = Portion::create(&conn, food_id, &portion("1 slice", 30)).unwrap();
        assert!(!Portion::delete(&conn, food_id + 1, slice.id).unwrap());
        assert!(Portion::delete(&conn, food_id, slice.id).unwrap());
        assert_eq!(Portion::count_for_food(&conn, food_id).unwrap(), 2);
    }

    #[test]
    fn test_portion_for_missing_food() {
        let conn = test_connection();
        let result = Portion::create(&conn, 77, &portion("1 cup", 240));
        assert!(matches!(result, Err(DbError::RecordNotFound(_))));
    }
}
