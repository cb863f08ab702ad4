//! Shared nutrient profile
//!
//! Used across foods, meals, journal snapshots and statistics.

use rusqlite::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{get_decimal, SqlDecimal};
use crate::nutrition::rounding::round_half_up;

/// The twelve tracked nutrients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Kilojoules,
    Proteins,
    Carbohydrates,
    Fiber,
    Sugar,
    Fat,
    Safa,
    Tfa,
    Cholesterol,
    Sodium,
    Calcium,
    Phe,
}

impl Nutrient {
    pub const ALL: [Nutrient; 12] = [
        Nutrient::Kilojoules,
        Nutrient::Proteins,
        Nutrient::Carbohydrates,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::Fat,
        Nutrient::Safa,
        Nutrient::Tfa,
        Nutrient::Cholesterol,
        Nutrient::Sodium,
        Nutrient::Calcium,
        Nutrient::Phe,
    ];

    /// Column name used by every nutrient-bearing table
    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Kilojoules => "kilojoules",
            Nutrient::Proteins => "proteins",
            Nutrient::Carbohydrates => "carbohydrates",
            Nutrient::Fiber => "fiber",
            Nutrient::Sugar => "sugar",
            Nutrient::Fat => "fat",
            Nutrient::Safa => "safa",
            Nutrient::Tfa => "tfa",
            Nutrient::Cholesterol => "cholesterol",
            Nutrient::Sodium => "sodium",
            Nutrient::Calcium => "calcium",
            Nutrient::Phe => "phe",
        }
    }
}

/// Comma separated nutrient columns, in `Nutrient::ALL` order
pub const NUTRIENT_COLUMNS: &str = "kilojoules, proteins, carbohydrates, fiber, sugar, fat, \
                                    safa, tfa, cholesterol, sodium, calcium, phe";

/// Nutrient values expressed against `reference_quantity` grams.
///
/// For a food the reference is its fixed basis (100 g). For a journal snapshot
/// the values are already scaled and the reference is the consumed quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub reference_quantity: Decimal,
    pub kilojoules: Decimal,
    pub proteins: Decimal,
    pub carbohydrates: Decimal,
    pub fiber: Decimal,
    pub sugar: Decimal,
    pub fat: Decimal,
    pub safa: Decimal,          // saturated fatty acids
    pub tfa: Decimal,           // trans fatty acids
    pub cholesterol: Decimal,   // milligrams
    pub sodium: Decimal,        // milligrams
    pub calcium: Decimal,       // milligrams
    pub phe: Decimal,           // phenylalanine, milligrams
}

impl NutrientProfile {
    /// Create a profile with every value at zero
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, nutrient: Nutrient) -> Decimal {
        match nutrient {
            Nutrient::Kilojoules => self.kilojoules,
            Nutrient::Proteins => self.proteins,
            Nutrient::Carbohydrates => self.carbohydrates,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::Fat => self.fat,
            Nutrient::Safa => self.safa,
            Nutrient::Tfa => self.tfa,
            Nutrient::Cholesterol => self.cholesterol,
            Nutrient::Sodium => self.sodium,
            Nutrient::Calcium => self.calcium,
            Nutrient::Phe => self.phe,
        }
    }

    pub fn set(&mut self, nutrient: Nutrient, value: Decimal) {
        let slot = match nutrient {
            Nutrient::Kilojoules => &mut self.kilojoules,
            Nutrient::Proteins => &mut self.proteins,
            Nutrient::Carbohydrates => &mut self.carbohydrates,
            Nutrient::Fiber => &mut self.fiber,
            Nutrient::Sugar => &mut self.sugar,
            Nutrient::Fat => &mut self.fat,
            Nutrient::Safa => &mut self.safa,
            Nutrient::Tfa => &mut self.tfa,
            Nutrient::Cholesterol => &mut self.cholesterol,
            Nutrient::Sodium => &mut self.sodium,
            Nutrient::Calcium => &mut self.calcium,
            Nutrient::Phe => &mut self.phe,
        };
        *slot = value;
    }

    /// Apply `f` to every nutrient, producing a profile against `reference_quantity`
    pub fn map<F>(&self, reference_quantity: Decimal, mut f: F) -> Self
    where
        F: FnMut(Decimal) -> Decimal,
    {
        let mut out = Self {
            reference_quantity,
            ..Self::default()
        };
        for nutrient in Nutrient::ALL {
            out.set(nutrient, f(self.get(nutrient)));
        }
        out
    }

    /// Like [`NutrientProfile::map`], stopping at the first error
    pub fn try_map<F, E>(&self, reference_quantity: Decimal, mut f: F) -> Result<Self, E>
    where
        F: FnMut(Decimal) -> Result<Decimal, E>,
    {
        let mut out = Self {
            reference_quantity,
            ..Self::default()
        };
        for nutrient in Nutrient::ALL {
            out.set(nutrient, f(self.get(nutrient))?);
        }
        Ok(out)
    }

    /// Combine two profiles field by field, reference quantity included
    pub fn zip_with<F>(&self, other: &NutrientProfile, f: F) -> Self
    where
        F: Fn(Decimal, Decimal) -> Decimal,
    {
        let mut out = Self {
            reference_quantity: f(self.reference_quantity, other.reference_quantity),
            ..Self::default()
        };
        for nutrient in Nutrient::ALL {
            out.set(nutrient, f(self.get(nutrient), other.get(nutrient)));
        }
        out
    }

    /// Add another profile to this one
    pub fn add(&self, other: &NutrientProfile) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    /// Subtract another profile from this one
    pub fn sub(&self, other: &NutrientProfile) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    /// Round every value to 2 decimal places, HALF_UP
    pub fn round_dp(&self) -> Self {
        self.map(round_half_up(self.reference_quantity), round_half_up)
    }

    /// True when no nutrient is negative
    pub fn is_non_negative(&self) -> bool {
        Nutrient::ALL.iter().all(|n| self.get(*n) >= Decimal::ZERO)
    }

    /// Read the nutrient columns plus the given quantity column from a row
    pub fn from_row(row: &Row, quantity_column: &str) -> rusqlite::Result<Self> {
        let mut profile = Self {
            reference_quantity: get_decimal(row, quantity_column)?,
            ..Self::default()
        };
        for nutrient in Nutrient::ALL {
            profile.set(nutrient, get_decimal(row, nutrient.as_str())?);
        }
        Ok(profile)
    }

    /// Nutrient values as SQL parameters, in `NUTRIENT_COLUMNS` order
    pub fn sql_values(&self) -> [SqlDecimal; 12] {
        Nutrient::ALL.map(|n| SqlDecimal(self.get(n)))
    }
}

impl std::ops::Add for NutrientProfile {
    type Output = NutrientProfile;

    fn add(self, other: NutrientProfile) -> NutrientProfile {
        NutrientProfile::add(&self, &other)
    }
}

impl std::ops::Sub for NutrientProfile {
    type Output = NutrientProfile;

    fn sub(self, other: NutrientProfile) -> NutrientProfile {
        NutrientProfile::sub(&self, &other)
    }
}

impl std::iter::Sum for NutrientProfile {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutrientProfile::zero(), |acc, p| acc + p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_get_set_cover_every_nutrient() {
        let mut profile = NutrientProfile::zero();
        for (i, nutrient) in Nutrient::ALL.iter().enumerate() {
            profile.set(*nutrient, Decimal::from(i as i64 + 1));
        }
        for (i, nutrient) in Nutrient::ALL.iter().enumerate() {
            assert_eq!(profile.get(*nutrient), Decimal::from(i as i64 + 1));
        }
        assert_eq!(profile.phe, Decimal::from(12));
    }

    #[test]
    fn test_add_then_sub_is_exact() {
        let a = NutrientProfile {
            reference_quantity: d("150"),
            kilojoules: d("123.45"),
            fat: d("0.01"),
            ..NutrientProfile::zero()
        };
        let b = NutrientProfile {
            reference_quantity: d("30"),
            kilojoules: d("9.99"),
            sodium: d("2.50"),
            ..NutrientProfile::zero()
        };
        let sum = a.add(&b);
        assert_eq!(sum.reference_quantity, d("180"));
        assert_eq!(sum.kilojoules, d("133.44"));
        assert_eq!(sum.sub(&b), a);
    }

    #[test]
    fn test_sum_starts_from_zero() {
        let total: NutrientProfile = Vec::<NutrientProfile>::new().into_iter().sum();
        assert_eq!(total, NutrientProfile::zero());
    }

    #[test]
    fn test_column_list_matches_enum_order() {
        let joined = Nutrient::ALL
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let normalized = NUTRIENT_COLUMNS.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(normalized, joined);
    }

    #[test]
    fn test_is_non_negative() {
        let mut profile = NutrientProfile::zero();
        assert!(profile.is_non_negative());
        profile.fiber = d("-0.01");
        assert!(!profile.is_non_negative());
    }
}
