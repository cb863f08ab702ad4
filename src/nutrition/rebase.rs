//! Rebasing of already scaled snapshots
//!
//! A snapshot only knows its current quantity and current values. Changing its
//! quantity derives per-100 values first, then scales those to the new quantity.

use rust_decimal::Decimal;

use super::error::{CalcResult, CalculationError};
use super::rounding::{scale_half_up, HUNDRED};
use crate::models::NutrientProfile;

/// Rebase a snapshot profile (expressed against its current quantity) to `new_quantity`.
///
/// Both steps round to 2 places, HALF_UP. Must be called before the snapshot's
/// stored quantity is overwritten.
pub fn rebase(snapshot: &NutrientProfile, new_quantity: Decimal) -> CalcResult<NutrientProfile> {
    let current = snapshot.reference_quantity;
    if current <= Decimal::ZERO {
        return Err(CalculationError::InvalidCurrentQuantity);
    }

    snapshot.try_map(new_quantity, |v| {
        scale_half_up(v, HUNDRED, current)
            .and_then(|base100| scale_half_up(base100, new_quantity, HUNDRED))
            .ok_or(CalculationError::Overflow(v))
    })
}
