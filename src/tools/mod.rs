//! Tools module
//!
//! Tool implementations behind the MCP server. Each tool validates its input,
//! runs against the database and returns a serializable response or a message.

pub mod foods;
pub mod journal;
pub mod meals;
pub mod statistics;
pub mod status;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::db::DbError;
use crate::models::MealType;

/// Parse an ISO date (YYYY-MM-DD)
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Parse a meal type name such as "LUNCH" or "afternoon snack"
pub fn parse_meal_type(value: &str) -> Result<MealType, String> {
    MealType::from_str(value).ok_or_else(|| {
        format!(
            "Invalid meal type '{}', expected one of: {}",
            value,
            MealType::ALL.map(|t| t.as_str()).join(", ")
        )
    })
}

/// Largest number accepted from a tool argument. Keeps products of two
/// inputs well inside the decimal range.
pub const MAX_INPUT: f64 = 1_000_000_000.0;

/// Convert a non-negative input number to an exact decimal
pub fn to_decimal(field: &str, value: f64) -> Result<Decimal, String> {
    if !value.is_finite() {
        return Err(format!("{} must be a number", field));
    }
    if value < 0.0 {
        return Err(format!("{} cannot be negative", field));
    }
    if value > MAX_INPUT {
        return Err(format!("{} cannot exceed {}", field, MAX_INPUT));
    }
    Decimal::from_f64(value)
        .map(|d| d.normalize())
        .ok_or_else(|| format!("{} is out of range", field))
}

/// Grams consumed: multiplier × portion size
pub fn quantity(multiplier: Decimal, portion_size: Decimal) -> Decimal {
    (multiplier * portion_size).normalize()
}

/// Check a name against a length limit after trimming
pub fn validate_name(kind: &str, name: &str, max_len: usize) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("{} name cannot be empty", kind));
    }
    if name.chars().count() > max_len {
        return Err(format!("{} name cannot exceed {} characters", kind, max_len));
    }
    Ok(name.to_string())
}

/// Turn a database error into a tool message, logging rejections
pub fn db_error(action: &str, e: DbError) -> String {
    match e {
        DbError::Connection(_) | DbError::Sqlite(_) => {
            tracing::error!("{} failed: {}", action, e);
            format!("Database error: {}", e)
        }
        _ => {
            tracing::warn!("{} rejected: {}", action, e);
            format!("Failed to {}: {}", action, e)
        }
    }
}
