//! In-memory collaborators for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::cache::normalize_table_name;
use crate::source::{MetadataSource, SourceError};
use crate::static_config::{StaticSchemaSource, StaticSummary, StaticTable, StaticTableSchema};
use crate::types::{
    Dependency, DependencyDocument, DocumentSource, Relationships, SchemaDocument, SummaryDocument,
};

/// Metadata source backed by a table map, with call counters and failures
#[derive(Debug, Default)]
pub struct MockMetadataSource {
    tables: HashMap<String, Vec<Value>>,
    failures: HashMap<String, SourceError>,
    summary_failure: Option<SourceError>,
    delay: Option<Duration>,
    schema_calls: AtomicUsize,
    dependency_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source knowing `tables`, each with a single `ID` column
    pub fn with_tables(tables: &[&str]) -> Self {
        tables
            .iter()
            .fold(Self::new(), |source, table| source.table(table))
    }

    pub fn table(mut self, table: &str) -> Self {
        self.tables.insert(
            normalize_table_name(table),
            vec![json!({"COLUMN_NAME": "ID", "DATA_TYPE": "INTEGER"})],
        );
        self
    }

    pub fn failing(mut self, table: &str, error: SourceError) -> Self {
        self.failures.insert(normalize_table_name(table), error);
        self
    }

    pub fn failing_summary(mut self, error: SourceError) -> Self {
        self.summary_failure = Some(error);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    pub fn dependency_calls(&self) -> usize {
        self.dependency_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.schema_calls() + self.dependency_calls() + self.summary_calls()
    }

    /// Highest number of simultaneously running calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn lookup(&self, table: &str) -> Result<&Vec<Value>, SourceError> {
        if let Some(err) = self.failures.get(table) {
            return Err(err.clone());
        }
        self.tables
            .get(table)
            .ok_or_else(|| SourceError::TableNotFound(table.to_string()))
    }
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    async fn get_schema_info(&self, table: Option<&str>) -> Result<SchemaDocument, SourceError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;

        let result = match table {
            Some(table) => {
                let table = normalize_table_name(table);
                self.lookup(&table).map(|columns| {
                    SchemaDocument::table(&table, columns.clone(), DocumentSource::Database)
                        .with_database_type("mock")
                })
            }
            None => {
                let mut names: Vec<&String> = self.tables.keys().collect();
                names.sort();
                let rows = names
                    .into_iter()
                    .map(|name| json!({"TABLE_NAME": name, "TABLE_TYPE": "TABLE"}))
                    .collect();
                Ok(SchemaDocument::overview(rows, DocumentSource::Database).with_database_type("mock"))
            }
        };

        self.leave();
        result
    }

    async fn get_table_dependencies(
        &self,
        table: &str,
    ) -> Result<DependencyDocument, SourceError> {
        self.dependency_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;

        let table = normalize_table_name(table);
        let result = self.lookup(&table).map(|_| {
            DependencyDocument::new(
                &table,
                vec![Dependency {
                    constraint_name: format!("FK_{table}_PARENT"),
                    parent_table: table.clone(),
                    parent_column: "PARENT_ID".to_string(),
                    referenced_table: "PARENT".to_string(),
                    referenced_column: "ID".to_string(),
                }],
                DocumentSource::Database,
            )
        });

        self.leave();
        result
    }

    async fn get_schema_summary(&self) -> Result<SummaryDocument, SourceError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;

        let result = match &self.summary_failure {
            Some(err) => Err(err.clone()),
            None => Ok(SummaryDocument {
                database_type: "mock".to_string(),
                tables: self.tables.len(),
                ..SummaryDocument::default()
            }),
        };

        self.leave();
        result
    }
}

/// Authored configuration held in memory
#[derive(Debug, Default)]
pub struct MockStaticSource {
    schemas: Vec<StaticTableSchema>,
}

impl MockStaticSource {
    pub fn with_tables(tables: &[&str]) -> Self {
        Self {
            schemas: tables.iter().map(|t| static_schema(t)).collect(),
        }
    }

    pub fn with_schema(mut self, schema: StaticTableSchema) -> Self {
        self.schemas
            .retain(|existing| existing.table_name != schema.table_name);
        self.schemas.push(schema);
        self
    }
}

/// Authored schema with two columns and no relationships
pub fn static_schema(table: &str) -> StaticTableSchema {
    let table = normalize_table_name(table);
    StaticTableSchema {
        display_name: table.clone(),
        table_name: table,
        table_type: "TABLE".to_string(),
        category: "test".to_string(),
        business_importance: "medium".to_string(),
        columns: vec![
            json!({"COLUMN_NAME": "ID"}),
            json!({"COLUMN_NAME": "NAME"}),
        ],
        relationships: Relationships::default(),
        business_logic: json!({}),
        ai_context: json!({}),
    }
}

impl StaticSchemaSource for MockStaticSource {
    fn get_all_tables(&self) -> Vec<StaticTable> {
        self.schemas
            .iter()
            .map(|schema| StaticTable {
                table_name: schema.table_name.clone(),
                table_type: schema.table_type.clone(),
                display_name: schema.display_name.clone(),
                category: Some(schema.category.clone()),
                business_importance: Some(schema.business_importance.clone()),
            })
            .collect()
    }

    fn get_table_schema(&self, table: &str) -> Option<StaticTableSchema> {
        let table = normalize_table_name(table);
        self.schemas.iter().find(|s| s.table_name == table).cloned()
    }

    fn get_summary(&self) -> StaticSummary {
        StaticSummary {
            total_tables: self.schemas.len(),
            total_columns: self.schemas.iter().map(|s| s.columns.len()).sum(),
            json_configs_loaded: self.schemas.len(),
        }
    }
}
