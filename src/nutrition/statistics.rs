//! Period statistics
//!
//! Totals, per-day averages and top-ten rankings over journal entries.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{CalcResult, CalculationError};
use super::rounding::divide_half_up;
use crate::models::{Journal, Nutrient};

/// Maximum number of ranked items
pub const TOP_N: usize = 10;

/// Nutrient a ranking is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDimension {
    Kilojoules,
    Proteins,
    Carbohydrates,
    Fiber,
    Fat,
}

impl RankDimension {
    pub const ALL: [RankDimension; 5] = [
        RankDimension::Kilojoules,
        RankDimension::Proteins,
        RankDimension::Carbohydrates,
        RankDimension::Fiber,
        RankDimension::Fat,
    ];

    pub fn nutrient(&self) -> Nutrient {
        match self {
            RankDimension::Kilojoules => Nutrient::Kilojoules,
            RankDimension::Proteins => Nutrient::Proteins,
            RankDimension::Carbohydrates => Nutrient::Carbohydrates,
            RankDimension::Fiber => Nutrient::Fiber,
            RankDimension::Fat => Nutrient::Fat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.nutrient().as_str()
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kilojoules" | "kj" | "energy" => Some(RankDimension::Kilojoules),
            "proteins" | "protein" => Some(RankDimension::Proteins),
            "carbohydrates" | "carbs" => Some(RankDimension::Carbohydrates),
            "fiber" | "fibre" => Some(RankDimension::Fiber),
            "fat" => Some(RankDimension::Fat),
            _ => None,
        }
    }
}

/// Summed (or averaged) values over a set of journal entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalTotals {
    pub quantity: Decimal,
    pub kilojoules: Decimal,
    pub proteins: Decimal,
    pub carbohydrates: Decimal,
    pub fiber: Decimal,
    pub fat: Decimal,
}

/// One line of a ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub journal_food_id: Option<i64>,
    pub journal_meal_id: Option<i64>,
    pub name: String,
    pub value: Decimal,
    pub count: u32,
}

/// A ranking for one dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub dimension: RankDimension,
    pub merged: bool,
    pub items: Vec<RankedItem>,
}

/// Everything reported for a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub totals: JournalTotals,
    pub averages: JournalTotals,
    pub simple_rankings: Vec<Ranking>,
    pub merged_rankings: Vec<Ranking>,
}

/// Sum quantity, energy and macronutrients over every entry
pub fn period_totals(entries: &[Journal]) -> JournalTotals {
    entries.iter().fold(JournalTotals::default(), |mut acc, entry| {
        let profile = entry.item.profile();
        acc.quantity += profile.reference_quantity;
        acc.kilojoules += profile.kilojoules;
        acc.proteins += profile.proteins;
        acc.carbohydrates += profile.carbohydrates;
        acc.fiber += profile.fiber;
        acc.fat += profile.fat;
        acc
    })
}

/// Number of days in `start..=end`
pub fn period_days(start: NaiveDate, end: NaiveDate) -> CalcResult<i64> {
    if end < start {
        return Err(CalculationError::InvalidPeriod {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok((end - start).num_days() + 1)
}

/// Divide totals by the inclusive day count of the period, rounding HALF_UP
pub fn period_averages(totals: &JournalTotals, start: NaiveDate, end: NaiveDate) -> CalcResult<JournalTotals> {
    let days = Decimal::from(period_days(start, end)?);
    let avg = |v: Decimal| divide_half_up(v, days).unwrap_or(Decimal::ZERO);

    Ok(JournalTotals {
        quantity: avg(totals.quantity),
        kilojoules: avg(totals.kilojoules),
        proteins: avg(totals.proteins),
        carbohydrates: avg(totals.carbohydrates),
        fiber: avg(totals.fiber),
        fat: avg(totals.fat),
    })
}

/// Totals for the entries consumed on `date`
pub fn daily_totals(entries: &[Journal], date: NaiveDate) -> JournalTotals {
    let day: Vec<Journal> = entries
        .iter()
        .filter(|e| e.consumed_at == date)
        .cloned()
        .collect();
    period_totals(&day)
}

/// Rank entries by one dimension.
///
/// With `merge_by_name` entries sharing a name are summed and counted, keeping
/// the ids of the first occurrence. Values `<= 0` are dropped. The sort is
/// stable, so equal values keep their input order.
pub fn top_ten(entries: &[Journal], dimension: RankDimension, merge_by_name: bool) -> Vec<RankedItem> {
    let nutrient = dimension.nutrient();
    let items = entries.iter().map(|entry| RankedItem {
        journal_food_id: entry.item.journal_food_id(),
        journal_meal_id: entry.item.journal_meal_id(),
        name: entry.item.name().to_string(),
        value: entry.item.profile().get(nutrient),
        count: 1,
    });

    let mut ranked: Vec<RankedItem> = if merge_by_name {
        let mut merged: Vec<RankedItem> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for item in items {
            match index.get(&item.name) {
                Some(&i) => {
                    merged[i].value += item.value;
                    merged[i].count += 1;
                }
                None => {
                    index.insert(item.name.clone(), merged.len());
                    merged.push(item);
                }
            }
        }
        merged
    } else {
        items.collect()
    };

    ranked.retain(|item| item.value > Decimal::ZERO);
    ranked.sort_by(|a, b| b.value.cmp(&a.value));
    ranked.truncate(TOP_N);
    ranked
}

/// Totals, averages and all ten rankings for `start..=end`
pub fn statistics_report(entries: &[Journal], start: NaiveDate, end: NaiveDate) -> CalcResult<StatisticsReport> {
    let days = period_days(start, end)?;
    let totals = period_totals(entries);
    let averages = period_averages(&totals, start, end)?;

    let rankings = |merged: bool| {
        RankDimension::ALL
            .iter()
            .map(|&dimension| Ranking {
                dimension,
                merged,
                items: top_ten(entries, dimension, merged),
            })
            .collect::<Vec<_>>()
    };

    Ok(StatisticsReport {
        start_date: start,
        end_date: end,
        days,
        totals,
        averages,
        simple_rankings: rankings(false),
        merged_rankings: rankings(true),
    })
}
