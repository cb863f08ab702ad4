//! Kilojoules Library
//!
//! Food, meal and nutrition journal tracking.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
