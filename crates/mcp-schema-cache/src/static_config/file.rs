//! File-backed authored schema configuration
//!
//! Layout of the configuration directory:
//!
//! ```text
//! schemas_config/
//! ├── tables_list.json      {"tables": {NAME: {table_type, display_name}}}
//! ├── global_patterns.json  {"column_patterns": {REGEX: {...}}}
//! └── tables/
//!     └── *.json            one authored schema per table
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{StaticSchemaSource, StaticSummary, StaticTable, StaticTableSchema};
use crate::cache::normalize_table_name;
use crate::error::{Error, Result};
use crate::types::Relationships;

const TABLES_LIST_FILE: &str = "tables_list.json";
const GLOBAL_PATTERNS_FILE: &str = "global_patterns.json";
const TABLES_DIR: &str = "tables";

const DEFAULT_TABLE_TYPE: &str = "TABLE";
const DEFAULT_CATEGORY: &str = "unknown";
const DEFAULT_IMPORTANCE: &str = "medium";

#[derive(Debug, Default, Deserialize)]
struct TablesList {
    #[serde(default)]
    tables: BTreeMap<String, TableListEntry>,
}

#[derive(Debug, Deserialize)]
struct TableListEntry {
    #[serde(default = "default_table_type")]
    table_type: String,
    display_name: Option<String>,
}

fn default_table_type() -> String {
    DEFAULT_TABLE_TYPE.to_string()
}

#[derive(Debug, Default, Deserialize)]
struct TableFile {
    table_name: Option<String>,
    display_name: Option<String>,
    #[serde(rename = "type")]
    table_type: Option<String>,
    category: Option<String>,
    business_importance: Option<String>,
    #[serde(default)]
    columns: Vec<Map<String, Value>>,
    #[serde(default)]
    key_columns: BTreeMap<String, KeyColumn>,
    #[serde(default)]
    relationships: Relationships,
    #[serde(default)]
    business_logic: Value,
    #[serde(default)]
    ai_context: Value,
}

#[derive(Debug, Default, Deserialize)]
struct KeyColumn {
    display_name: Option<String>,
    description: Option<String>,
    semantic_type: Option<String>,
    business_importance: Option<String>,
    usage_notes: Option<String>,
    ai_hints: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalPatterns {
    #[serde(default)]
    column_patterns: BTreeMap<String, PatternInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PatternInfo {
    semantic_type: Option<String>,
    default_description: Option<String>,
    business_hints: Option<Value>,
}

/// Authored configuration loaded from a directory.
///
/// Table names are upper-cased. Global patterns are tried in lexical order
/// of their expressions and the first match wins.
#[derive(Debug, Default)]
pub struct FileSchemaConfig {
    root: PathBuf,
    tables: BTreeMap<String, TableListEntry>,
    table_files: HashMap<String, TableFile>,
    patterns: Vec<(Regex, PatternInfo)>,
}

impl FileSchemaConfig {
    /// Load every configuration file under `dir`.
    ///
    /// A missing directory or missing files yield an empty configuration. A
    /// malformed per-table file is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaticConfig`] if `tables_list.json` or
    /// `global_patterns.json` exist but cannot be read or parsed.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        if !root.is_dir() {
            tracing::debug!(path = %root.display(), "Static schema directory not found");
            return Ok(Self {
                root,
                ..Self::default()
            });
        }

        let tables = read_optional::<TablesList>(&root.join(TABLES_LIST_FILE))?
            .unwrap_or_default()
            .tables
            .into_iter()
            .map(|(name, entry)| (normalize_table_name(&name), entry))
            .collect();

        let patterns = read_optional::<GlobalPatterns>(&root.join(GLOBAL_PATTERNS_FILE))?
            .unwrap_or_default()
            .column_patterns
            .into_iter()
            .filter_map(|(pattern, info)| {
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(regex) => Some((regex, info)),
                    Err(e) => {
                        tracing::warn!(pattern = %pattern, error = %e, "Skipping invalid column pattern");
                        None
                    }
                }
            })
            .collect();

        let table_files = load_table_files(&root.join(TABLES_DIR));

        let config = Self {
            root,
            tables,
            table_files,
            patterns,
        };

        tracing::info!(
            path = %config.root.display(),
            whitelisted = config.tables.len(),
            table_configs = config.table_files.len(),
            patterns = config.patterns.len(),
            "Loaded static schema configuration"
        );

        Ok(config)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether nothing was loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.table_files.is_empty()
    }

    fn build_schema(&self, table: &str) -> Option<StaticTableSchema> {
        let config = self.table_files.get(table);
        let listed = self.tables.get(table);
        if config.is_none() && listed.is_none() {
            return None;
        }

        let display_name = config
            .and_then(|c| c.display_name.clone())
            .or_else(|| listed.and_then(|l| l.display_name.clone()))
            .unwrap_or_else(|| table.to_string());

        let Some(config) = config else {
            return Some(StaticTableSchema {
                table_name: table.to_string(),
                display_name,
                table_type: DEFAULT_TABLE_TYPE.to_string(),
                category: DEFAULT_CATEGORY.to_string(),
                business_importance: DEFAULT_IMPORTANCE.to_string(),
                columns: Vec::new(),
                relationships: Relationships::default(),
                business_logic: Value::Object(Map::new()),
                ai_context: Value::Object(Map::new()),
            });
        };

        let columns = if config.columns.is_empty() {
            config
                .key_columns
                .iter()
                .map(|(name, key)| key_column_to_column(name, key))
                .collect()
        } else {
            config
                .columns
                .iter()
                .map(|column| self.enhance_column(column, &config.key_columns))
                .collect()
        };

        Some(StaticTableSchema {
            table_name: table.to_string(),
            display_name,
            table_type: config
                .table_type
                .clone()
                .unwrap_or_else(default_table_type),
            category: config
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            business_importance: config
                .business_importance
                .clone()
                .unwrap_or_else(|| DEFAULT_IMPORTANCE.to_string()),
            columns,
            relationships: config.relationships.clone(),
            business_logic: object_or_empty(&config.business_logic),
            ai_context: object_or_empty(&config.ai_context),
        })
    }

    fn enhance_column(
        &self,
        column: &Map<String, Value>,
        key_columns: &BTreeMap<String, KeyColumn>,
    ) -> Value {
        let mut enhanced = column.clone();
        let name = column
            .get("COLUMN_NAME")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if let Some(key) = key_columns.get(name) {
            insert_opt(&mut enhanced, "semantic_type", key.semantic_type.clone());
            insert_opt(
                &mut enhanced,
                "business_importance",
                key.business_importance.clone(),
            );
            insert_opt(&mut enhanced, "enhanced_description", key.description.clone());
            insert_opt(&mut enhanced, "usage_notes", key.usage_notes.clone());
            insert_opt(&mut enhanced, "ai_hints", key.ai_hints.clone());
        } else if let Some((_, info)) = self.patterns.iter().find(|(re, _)| re.is_match(name)) {
            insert_opt(&mut enhanced, "semantic_type", info.semantic_type.clone());
            insert_opt(
                &mut enhanced,
                "pattern_description",
                info.default_description.clone(),
            );
            insert_opt(&mut enhanced, "business_hints", info.business_hints.clone());
        }

        Value::Object(enhanced)
    }
}

impl StaticSchemaSource for FileSchemaConfig {
    fn get_all_tables(&self) -> Vec<StaticTable> {
        self.tables
            .iter()
            .map(|(name, entry)| {
                let detail = self.table_files.get(name);
                StaticTable {
                    table_name: name.clone(),
                    table_type: entry.table_type.clone(),
                    display_name: entry.display_name.clone().unwrap_or_else(|| name.clone()),
                    category: detail.and_then(|d| d.category.clone()),
                    business_importance: detail.and_then(|d| d.business_importance.clone()),
                }
            })
            .collect()
    }

    fn get_table_schema(&self, table: &str) -> Option<StaticTableSchema> {
        self.build_schema(&normalize_table_name(table))
    }

    fn get_summary(&self) -> StaticSummary {
        let total_columns = self
            .tables
            .keys()
            .filter_map(|name| self.build_schema(name))
            .map(|schema| schema.columns.len())
            .sum();

        StaticSummary {
            total_tables: self.tables.len(),
            total_columns,
            json_configs_loaded: self.table_files.len(),
        }
    }
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| Error::StaticConfig(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::StaticConfig(format!("Failed to parse {}: {e}", path.display())))
}

fn load_table_files(dir: &Path) -> HashMap<String, TableFile> {
    let Ok(entries) = fs::read_dir(dir) else {
        return HashMap::new();
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut table_files = HashMap::new();
    for path in paths {
        match read_optional::<TableFile>(&path) {
            Ok(Some(file)) => {
                let name = file
                    .table_name
                    .clone()
                    .or_else(|| {
                        path.file_stem()
                            .map(|stem| stem.to_string_lossy().into_owned())
                    })
                    .unwrap_or_default();
                table_files.insert(normalize_table_name(&name), file);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Skipping table configuration");
            }
        }
    }
    table_files
}

fn key_column_to_column(name: &str, key: &KeyColumn) -> Value {
    let mut column = Map::new();
    column.insert("COLUMN_NAME".to_string(), Value::String(name.to_string()));
    column.insert(
        "display_name".to_string(),
        Value::String(key.display_name.clone().unwrap_or_else(|| name.to_string())),
    );
    column.insert(
        "description".to_string(),
        Value::String(
            key.description
                .clone()
                .unwrap_or_else(|| format!("Column: {name}")),
        ),
    );
    insert_opt(&mut column, "semantic_type", key.semantic_type.clone());
    insert_opt(
        &mut column,
        "business_importance",
        key.business_importance.clone(),
    );
    insert_opt(&mut column, "usage_notes", key.usage_notes.clone());
    insert_opt(&mut column, "ai_hints", key.ai_hints.clone());
    Value::Object(column)
}

fn insert_opt<V: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<V>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

fn object_or_empty(value: &Value) -> Value {
    if value.is_null() {
        Value::Object(Map::new())
    } else {
        value.clone()
    }
}
