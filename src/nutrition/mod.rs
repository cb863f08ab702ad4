//! Nutrition calculation module
//!
//! Scaling, rebasing, aggregation, journal snapshots and period statistics.
//! Everything here is pure; persistence lives in `models`.

pub mod aggregate;
pub mod error;
pub mod rebase;
pub mod rounding;
pub mod scaling;
pub mod snapshot;
pub mod statistics;

pub use aggregate::{add_child, compose_meal, remove_child, totals, AdjustedMealFood, MealComposition};
pub use error::{CalcResult, CalculationError};
pub use rebase::rebase;
pub use rounding::round_half_up;
pub use scaling::scale;
pub use snapshot::{
    snapshot_food, snapshot_meal, snapshot_meal_food, FoodSnapshot, MealSnapshot, PortionSnapshot,
};
pub use statistics::{
    daily_totals, period_averages, period_days, period_totals, statistics_report, top_ten, JournalTotals,
    RankDimension, RankedItem, Ranking, StatisticsReport,
};
