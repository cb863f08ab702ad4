//! Decimal column support
//!
//! SQLite has no exact decimal type, so nutrient values are stored as TEXT
//! and read back through [`SqlDecimal`].

use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use rust_decimal::Decimal;

/// Newtype bridging `rust_decimal::Decimal` and SQLite TEXT columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlDecimal(pub Decimal);

impl ToSql for SqlDecimal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for SqlDecimal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                Decimal::from_str(text.trim())
                    .map(SqlDecimal)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
            ValueRef::Integer(i) => Ok(SqlDecimal(Decimal::from(i))),
            ValueRef::Real(f) => Decimal::try_from(f)
                .map(SqlDecimal)
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Read a decimal column by name
pub fn get_decimal(row: &Row, column: &str) -> rusqlite::Result<Decimal> {
    Ok(row.get::<_, SqlDecimal>(column)?.0)
}
