//! Calculation errors
//!
//! Raised by the engines when an invariant of the arithmetic is violated.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by scaling, rebasing, aggregation and statistics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    #[error("Reference quantity must be greater than zero")]
    InvalidReference,

    #[error("Current quantity of the snapshot must be greater than zero")]
    InvalidCurrentQuantity,

    #[error("Period end {end} is before start {start}")]
    InvalidPeriod { start: String, end: String },

    #[error("Value out of range while scaling {0}")]
    Overflow(Decimal),

    #[error("Child {0} is not part of the journal meal")]
    ChildNotPresent(i64),

    #[error("Child {0} is already part of the journal meal")]
    ChildAlreadyPresent(i64),
}

/// Result type for calculations
pub type CalcResult<T> = Result<T, CalculationError>;
