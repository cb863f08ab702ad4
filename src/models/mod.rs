//! Data models
//!
//! Rust structs representing database entities.

mod food;
mod journal;
mod journal_food;
mod journal_meal;
mod meal;
mod nutrition;
mod portion;

pub use food::{lookup_all, Food, FoodCreate, FoodLookup, FoodUpdate};
pub use journal::{
    Journal, JournalFoodCreate, JournalItem, JournalMealCreate, JournalUpdate, MealType,
};
pub use journal_food::{JournalFood, JournalPortion};
pub use journal_meal::{JournalMeal, JournalMealFood};
pub use meal::{validate_meal_name, Meal, MealCreate, MealFood};
pub use nutrition::{Nutrient, NutrientProfile, NUTRIENT_COLUMNS};
pub use portion::{Portion, PortionCreate, MAX_PORTIONS, PROTECTED_PORTIONS};

/// Maximum name lengths, checked before any write
pub mod limits {
    pub use super::food::MAX_NAME_LEN as FOOD_NAME;
    pub use super::meal::MAX_NAME_LEN as MEAL_NAME;
    pub use super::portion::MAX_NAME_LEN as PORTION_NAME;
}
