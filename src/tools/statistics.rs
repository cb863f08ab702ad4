//! Statistics Tools
//!
//! Totals, per-day averages and top-ten rankings over the journal.

use chrono::NaiveDate;
use serde::Serialize;

use super::{db_error, parse_date};
use crate::db::{Database, DbError};
use crate::models::Journal;
use crate::nutrition::{
    daily_totals, period_days, statistics_report, top_ten, JournalTotals, RankDimension, Ranking,
    StatisticsReport,
};

#[derive(Debug, Serialize)]
pub struct DailyTotalsResponse {
    pub date: NaiveDate,
    pub entry_count: usize,
    pub totals: JournalTotals,
}

fn parse_period(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), String> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    period_days(start, end).map_err(|e| db_error("read statistics", DbError::from(e)))?;
    Ok((start, end))
}

fn load_period(db: &Database, user_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<Journal>, String> {
    db.with_conn(|conn| Journal::list_between(conn, user_id, start, end))
        .map_err(|e| db_error("read statistics", e))
}

/// Totals for a single day
pub fn get_daily_totals(db: &Database, user_id: i64, date: &str) -> Result<DailyTotalsResponse, String> {
    let date = parse_date(date)?;
    let entries = load_period(db, user_id, date, date)?;

    Ok(DailyTotalsResponse {
        date,
        entry_count: entries.len(),
        totals: daily_totals(&entries, date),
    })
}

/// Totals, averages and all rankings for `start..=end`
pub fn get_statistics(db: &Database, user_id: i64, start: &str, end: &str) -> Result<StatisticsReport, String> {
    let (start, end) = parse_period(start, end)?;
    let entries = load_period(db, user_id, start, end)?;
    tracing::debug!(user_id, %start, %end, entries = entries.len(), "statistics");

    statistics_report(&entries, start, end).map_err(|e| db_error("read statistics", DbError::from(e)))
}

/// A single top-ten ranking for `start..=end`
pub fn get_ranking(
    db: &Database,
    user_id: i64,
    start: &str,
    end: &str,
    dimension: &str,
    merged: bool,
) -> Result<Ranking, String> {
    let dimension = RankDimension::from_str(dimension).ok_or_else(|| {
        format!(
            "Invalid dimension '{}', expected one of: {}",
            dimension,
            RankDimension::ALL.map(|d| d.as_str()).join(", ")
        )
    })?;
    let (start, end) = parse_period(start, end)?;
    let entries = load_period(db, user_id, start, end)?;

    Ok(Ranking {
        dimension,
        merged,
        items: top_ten(&entries, dimension, merged),
    })
}
