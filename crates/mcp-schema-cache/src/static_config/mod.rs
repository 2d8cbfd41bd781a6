//! Authored schema configuration
//!
//! The static tier is filled from JSON files maintained by hand: a whitelist
//! of tables, per-table column and relationship descriptions, and global
//! column-name patterns. None of it requires database connectivity.

mod file;

use serde::Serialize;
use serde_json::Value;

pub use file::FileSchemaConfig;

use crate::types::Relationships;

/// Whitelisted table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StaticTable {
    pub table_name: String,
    pub table_type: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_importance: Option<String>,
}

/// Authored schema of one table, columns already enriched
#[derive(Debug, Clone, PartialEq)]
pub struct StaticTableSchema {
    pub table_name: String,
    pub display_name: String,
    pub table_type: String,
    pub category: String,
    pub business_importance: String,
    pub columns: Vec<Value>,
    pub relationships: Relationships,
    pub business_logic: Value,
    pub ai_context: Value,
}

/// Totals across the authored configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StaticSummary {
    pub total_tables: usize,
    pub total_columns: usize,
    /// Number of per-table files loaded
    pub json_configs_loaded: usize,
}

/// Source of authored schema documents
pub trait StaticSchemaSource: Send + Sync {
    /// Whitelisted tables
    fn get_all_tables(&self) -> Vec<StaticTable>;

    /// Authored schema for `table`, `None` if not configured
    fn get_table_schema(&self, table: &str) -> Option<StaticTableSchema>;

    fn get_summary(&self) -> StaticSummary;
}
