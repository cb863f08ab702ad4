//! Kilojoules MCP Server Implementation
//!
//! Implements the MCP server with all food, meal, journal and statistics tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::tools::foods::{self, NutrientInput};
use crate::tools::journal;
use crate::tools::meals;
use crate::tools::statistics;
use crate::tools::status::StatusTracker;

/// Kilojoules MCP Service
#[derive(Clone)]
pub struct KilojoulesService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<KilojoulesService>,
}

impl KilojoulesService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Serialize a tool result as pretty JSON
fn json_result<T: Serialize>(result: Result<T, String>) -> Result<CallToolResult, McpError> {
    let value = result.map_err(|e| McpError::internal_error(e, None))?;
    let json = serde_json::to_string_pretty(&value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn default_user_id() -> i64 { 1 }
fn default_search_limit() -> i64 { 20 }
fn default_list_limit() -> i64 { 50 }
fn default_multiplier() -> f64 { 1.0 }
fn default_portion_size() -> f64 { 1.0 }

// ============================================================================
// Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodParams {
    /// Food name (1 to 255 characters)
    pub name: String,
    /// Nutrient values per 100 g; missing values are 0
    #[serde(flatten)]
    pub nutrients: NutrientInput,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodIdParams {
    /// Food ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodParams {
    /// Food ID to update
    pub id: i64,
    /// New name (optional)
    pub name: Option<String>,
    /// Nutrient values per 100 g to change; others are kept
    #[serde(flatten)]
    pub nutrients: NutrientInput,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddPortionParams {
    /// Food ID
    pub food_id: i64,
    /// Portion name, e.g. "1 slice" (1 to 55 characters)
    pub name: String,
    /// Portion size in grams
    pub size: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeletePortionParams {
    /// Food ID
    pub food_id: i64,
    /// Portion ID to delete
    pub id: i64,
}

// ============================================================================
// Meal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMealParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Meal name (1 to 75 characters)
    pub name: String,
    /// Foods to add, each at multiplier × portion_size grams
    pub food_ids: Vec<i64>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Portion size in grams (default 1)
    #[serde(default = "default_portion_size")]
    pub portion_size: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealIdParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Meal ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListMealsParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Search query for meal name (optional)
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodsToMealParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Meal ID
    pub id: i64,
    pub food_ids: Vec<i64>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Portion size in grams (default 1)
    #[serde(default = "default_portion_size")]
    pub portion_size: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RenameMealParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Meal ID
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealFoodParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    pub meal_id: i64,
    pub meal_food_id: i64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Portion size in grams (default 1)
    #[serde(default = "default_portion_size")]
    pub portion_size: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveMealFoodParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    pub meal_id: i64,
    pub meal_food_id: i64,
}

// ============================================================================
// Journal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Date in YYYY-MM-DD format
    pub date: String,
    /// BREAKFAST, MID_MORNING_SNACK, LUNCH, AFTERNOON_SNACK or DINNER
    pub meal_type: String,
    pub food_id: i64,
    /// Number of portions, or grams when no portion is given
    pub multiplier: f64,
    /// One of the food's portions (optional)
    pub portion_id: Option<i64>,
    /// Name shown in the journal (defaults to the food name)
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Date in YYYY-MM-DD format
    pub date: String,
    /// BREAKFAST, MID_MORNING_SNACK, LUNCH, AFTERNOON_SNACK or DINNER
    pub meal_type: String,
    pub meal_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JournalEntryParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Journal entry ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JournalDayParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Date in YYYY-MM-DD format
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateJournalEntryParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    pub id: i64,
    /// New date (optional)
    pub date: Option<String>,
    /// New meal type (optional)
    pub meal_type: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateJournalFoodParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Journal entry ID of a logged food
    pub id: i64,
    /// Number of portions, or grams when no portion is given
    pub multiplier: f64,
    /// One of the logged food's portions (optional)
    pub portion_id: Option<i64>,
    /// New name (optional)
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodToJournalMealParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Journal entry ID of a logged meal
    pub id: i64,
    pub food_id: i64,
    /// Number of portions, or grams when no portion is given
    pub multiplier: f64,
    /// One of the food's portions (optional)
    pub portion_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateJournalMealFoodParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Journal entry ID of a logged meal
    pub id: i64,
    pub journal_meal_food_id: i64,
    /// Number of portions, or grams when no portion is given
    pub multiplier: f64,
    /// One of the meal food's portions (optional)
    pub portion_id: Option<i64>,
    /// New name (optional)
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveJournalMealFoodParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Journal entry ID of a logged meal
    pub id: i64,
    pub journal_meal_food_id: i64,
}

// ============================================================================
// Statistics Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StatisticsParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// First day, YYYY-MM-DD
    pub start_date: String,
    /// Last day (inclusive), YYYY-MM-DD
    pub end_date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RankingParams {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// First day, YYYY-MM-DD
    pub start_date: String,
    /// Last day (inclusive), YYYY-MM-DD
    pub end_date: String,
    /// kilojoules, proteins, carbohydrates, fiber or fat
    pub dimension: String,
    /// Sum entries sharing a name (default false)
    #[serde(default)]
    pub merged: bool,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl KilojoulesService {
    // --- Status ---

    #[tool(description = "Get the current status of the kilojoules service including build info, database status, and process information")]
    async fn kilojoules_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(Ok(status))
    }

    #[tool(description = "Get instructions for foods, portions, meals, journal logging and statistics. Call this when starting a logging session.")]
    fn journal_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::JOURNAL_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(JOURNAL_INSTRUCTIONS)]))
    }

    // --- Foods ---

    #[tool(description = "Create a food with nutrient values per 100 g. Adds the protected '1 g' and '100 g' portions.")]
    fn add_food(&self, Parameters(p): Parameters<AddFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(foods::add_food(&self.database, &p.name, &p.nutrients))
    }

    #[tool(description = "Get a food with its portions and the number of meals using it")]
    fn get_food(&self, Parameters(p): Parameters<FoodIdParams>) -> Result<CallToolResult, McpError> {
        let result = foods::get_food(&self.database, p.id)
            .and_then(|food| food.ok_or_else(|| format!("Food not found with id: {}", p.id)));
        json_result(result)
    }

    #[tool(description = "Search foods by name")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        json_result(foods::search_foods(&self.database, &p.query, p.limit))
    }

    #[tool(description = "List foods by name with pagination")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        json_result(foods::list_foods(&self.database, p.limit, p.offset))
    }

    #[tool(description = "Update a food's name or nutrient values. Meals follow the change; journal entries keep their logged values.")]
    fn update_food(&self, Parameters(p): Parameters<UpdateFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(foods::update_food(&self.database, p.id, p.name.as_deref(), &p.nutrients))
    }

    #[tool(description = "Delete a food. Fails while any meal uses it.")]
    fn delete_food(&self, Parameters(p): Parameters<FoodIdParams>) -> Result<CallToolResult, McpError> {
        json_result(foods::delete_food(&self.database, p.id))
    }

    #[tool(description = "Add a named portion (e.g. '1 slice' = 30 g) to a food. At most 9 portions per food.")]
    fn add_portion(&self, Parameters(p): Parameters<AddPortionParams>) -> Result<CallToolResult, McpError> {
        json_result(foods::add_portion(&self.database, p.food_id, &p.name, p.size))
    }

    #[tool(description = "Delete a portion of a food. The '1 g' and '100 g' portions cannot be deleted.")]
    fn delete_portion(&self, Parameters(p): Parameters<DeletePortionParams>) -> Result<CallToolResult, McpError> {
        json_result(foods::delete_portion(&self.database, p.food_id, p.id))
    }

    // --- Meals ---

    #[tool(description = "Create a meal from foods, each at multiplier × portion_size grams")]
    fn create_meal(&self, Parameters(p): Parameters<CreateMealParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::create_meal(&self.database, p.user_id, &p.name, p.food_ids, p.multiplier, p.portion_size))
    }

    #[tool(description = "Get a meal with every food scaled and the totals")]
    fn get_meal(&self, Parameters(p): Parameters<MealIdParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::get_meal(&self.database, p.user_id, p.id))
    }

    #[tool(description = "List meals, optionally filtered by name")]
    fn list_meals(&self, Parameters(p): Parameters<ListMealsParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::list_meals(&self.database, p.user_id, p.query.as_deref(), p.limit, p.offset))
    }

    #[tool(description = "Add foods to a meal, each at multiplier × portion_size grams")]
    fn add_foods_to_meal(&self, Parameters(p): Parameters<AddFoodsToMealParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::add_foods_to_meal(&self.database, p.user_id, p.id, p.food_ids, p.multiplier, p.portion_size))
    }

    #[tool(description = "Rename a meal")]
    fn rename_meal(&self, Parameters(p): Parameters<RenameMealParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::rename_meal(&self.database, p.user_id, p.id, &p.name))
    }

    #[tool(description = "Change the quantity of one food in a meal")]
    fn update_meal_food(&self, Parameters(p): Parameters<UpdateMealFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::update_meal_food(&self.database, p.user_id, p.meal_id, p.meal_food_id, p.multiplier, p.portion_size))
    }

    #[tool(description = "Remove one food from a meal")]
    fn remove_meal_food(&self, Parameters(p): Parameters<RemoveMealFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::remove_meal_food(&self.database, p.user_id, p.meal_id, p.meal_food_id))
    }

    #[tool(description = "Delete a meal. Journal entries logged from it are kept.")]
    fn delete_meal(&self, Parameters(p): Parameters<MealIdParams>) -> Result<CallToolResult, McpError> {
        json_result(meals::delete_meal(&self.database, p.user_id, p.id))
    }

    // --- Journal ---

    #[tool(description = "Log a food into the journal for a date and meal type")]
    fn log_food(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::log_food(
            &self.database,
            p.user_id,
            &p.date,
            &p.meal_type,
            p.food_id,
            p.multiplier,
            p.portion_id,
            p.name.as_deref(),
        ))
    }

    #[tool(description = "Log a meal into the journal for a date and meal type")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::log_meal(&self.database, p.user_id, &p.date, &p.meal_type, p.meal_id))
    }

    #[tool(description = "Get a journal entry by ID")]
    fn get_journal_entry(&self, Parameters(p): Parameters<JournalEntryParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::get_journal_entry(&self.database, p.user_id, p.id))
    }

    #[tool(description = "Get all journal entries of a day with the day's totals")]
    fn get_journal_day(&self, Parameters(p): Parameters<JournalDayParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::get_journal_day(&self.database, p.user_id, &p.date))
    }

    #[tool(description = "Move a journal entry to another date or meal type")]
    fn update_journal_entry(&self, Parameters(p): Parameters<UpdateJournalEntryParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::update_journal_entry(
            &self.database,
            p.user_id,
            p.id,
            p.date.as_deref(),
            p.meal_type.as_deref(),
        ))
    }

    #[tool(description = "Change the quantity or name of a logged food")]
    fn update_journal_food(&self, Parameters(p): Parameters<UpdateJournalFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::update_journal_food(
            &self.database,
            p.user_id,
            p.id,
            p.multiplier,
            p.portion_id,
            p.name.as_deref(),
        ))
    }

    #[tool(description = "Add a food to a logged meal")]
    fn add_food_to_journal_meal(&self, Parameters(p): Parameters<AddFoodToJournalMealParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::add_food_to_journal_meal(
            &self.database,
            p.user_id,
            p.id,
            p.food_id,
            p.multiplier,
            p.portion_id,
        ))
    }

    #[tool(description = "Change the quantity or name of one food of a logged meal")]
    fn update_journal_meal_food(&self, Parameters(p): Parameters<UpdateJournalMealFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::update_journal_meal_food(
            &self.database,
            p.user_id,
            p.id,
            p.journal_meal_food_id,
            p.multiplier,
            p.portion_id,
            p.name.as_deref(),
        ))
    }

    #[tool(description = "Remove one food from a logged meal")]
    fn remove_journal_meal_food(&self, Parameters(p): Parameters<RemoveJournalMealFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::remove_journal_meal_food(&self.database, p.user_id, p.id, p.journal_meal_food_id))
    }

    #[tool(description = "Delete a journal entry")]
    fn delete_journal_entry(&self, Parameters(p): Parameters<JournalEntryParams>) -> Result<CallToolResult, McpError> {
        json_result(journal::delete_journal_entry(&self.database, p.user_id, p.id))
    }

    // --- Statistics ---

    #[tool(description = "Get quantity, kilojoule and macronutrient totals for one day")]
    fn get_daily_totals(&self, Parameters(p): Parameters<JournalDayParams>) -> Result<CallToolResult, McpError> {
        json_result(statistics::get_daily_totals(&self.database, p.user_id, &p.date))
    }

    #[tool(description = "Get totals, per-day averages and top 10 rankings (simple and merged by name) for a date range")]
    fn get_statistics(&self, Parameters(p): Parameters<StatisticsParams>) -> Result<CallToolResult, McpError> {
        json_result(statistics::get_statistics(&self.database, p.user_id, &p.start_date, &p.end_date))
    }

    #[tool(description = "Get one top 10 ranking by kilojoules, proteins, carbohydrates, fiber or fat for a date range")]
    fn get_ranking(&self, Parameters(p): Parameters<RankingParams>) -> Result<CallToolResult, McpError> {
        json_result(statistics::get_ranking(
            &self.database,
            p.user_id,
            &p.start_date,
            &p.end_date,
            &p.dimension,
            p.merged,
        ))
    }
}

#[tool_handler]
impl ServerHandler for KilojoulesService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "kilojoules".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Kilojoules".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Kilojoules - food, meal and nutrition journal tracking. \
                 IMPORTANT: Call journal_instructions first. \
                 Foods: add/get/search/list/update/delete_food, add/delete_portion. \
                 Meals: create/get/list/rename/delete_meal, add_foods_to_meal, update/remove_meal_food. \
                 Journal: log_food, log_meal, get_journal_entry, get_journal_day, update_journal_entry, \
                 update_journal_food, add_food_to_journal_meal, update/remove_journal_meal_food, delete_journal_entry. \
                 Statistics: get_daily_totals, get_statistics, get_ranking."
                    .into(),
            ),
        }
    }
}
