//! Cache warm-up from authored configuration and the live source

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::Instant;

use super::config::PreloadConfig;
use super::report::{PreloadReport, StaticPreloadReport, TableFailure};
use crate::cache::{CacheKey, SchemaCache};
use crate::error::{Error, Result};
use crate::source::{MetadataSource, SourceError};
use crate::static_config::{StaticSchemaSource, StaticTableSchema};
use crate::types::{DocumentSource, SchemaDocument, StaticAnnotations, SummaryDocument};

/// `database_type` reported by the static-tier summary
const STATIC_DATABASE_TYPE: &str = "json_config";

/// Failed tables listed in the completion warning
const MAX_LOGGED_FAILURES: usize = 10;

enum Validation {
    Validated,
    Missing,
    Unchecked,
}

/// Fills both cache tiers ahead of the first request.
///
/// The static phase runs sequentially and never fails. The dynamic phase
/// fetches tables through a bounded pool; individual failures are collected
/// into the report instead of aborting the batch.
pub struct SchemaPreloader {
    cache: SchemaCache,
    source: Arc<dyn MetadataSource>,
    static_source: Option<Arc<dyn StaticSchemaSource>>,
    config: RwLock<Option<PreloadConfig>>,
    validate_static: bool,
}

impl std::fmt::Debug for SchemaPreloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaPreloader")
            .field("cache", &self.cache)
            .field("has_static_source", &self.static_source.is_some())
            .field("config", &*self.config.read())
            .field("validate_static", &self.validate_static)
            .finish_non_exhaustive()
    }
}

impl SchemaPreloader {
    #[must_use]
    pub fn new(cache: SchemaCache, source: Arc<dyn MetadataSource>) -> Self {
        Self {
            cache,
            source,
            static_source: None,
            config: RwLock::new(None),
            validate_static: true,
        }
    }

    #[must_use]
    pub fn with_static_source(mut self, static_source: Arc<dyn StaticSchemaSource>) -> Self {
        self.static_source = Some(static_source);
        self
    }

    /// Check static tables against the live source before caching them
    #[must_use]
    pub const fn with_static_validation(mut self, enabled: bool) -> Self {
        self.validate_static = enabled;
        self
    }

    #[must_use]
    pub fn with_config(self, config: PreloadConfig) -> Self {
        *self.config.write() = Some(config);
        self
    }

    #[must_use]
    pub fn config(&self) -> Option<PreloadConfig> {
        self.config.read().clone()
    }

    /// Load the preload configuration, replacing any previous one.
    ///
    /// Returns whether a configuration is now present. A missing file or a
    /// directory path leaves no configuration and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreloadConfig`] for malformed content; the previous
    /// configuration is kept in that case.
    pub fn load_configuration(&self, path: impl AsRef<Path>) -> Result<bool> {
        let loaded = PreloadConfig::load(path)?;
        let present = loaded.is_some();
        *self.config.write() = loaded;
        Ok(present)
    }

    /// Fill the static tier from authored configuration.
    ///
    /// Returns `None` when no static source is configured.
    pub async fn preload_static(&self) -> Option<StaticPreloadReport> {
        let static_source = self.static_source.as_ref()?;

        let tables = static_source.get_all_tables();
        let rows: Vec<Value> = tables
            .iter()
            .filter_map(|t| serde_json::to_value(t).ok())
            .collect();
        self.cache.set(
            CacheKey::database_overview().into_static().to_key_string(),
            SchemaDocument::overview(rows, DocumentSource::JsonConfigSystem).into(),
        );

        let mut report = StaticPreloadReport::default();
        for table in &tables {
            let name = &table.table_name;
            let validation = self.validate_table(name).await;
            let database_validated = match validation {
                Validation::Validated => {
                    report.validated_tables.push(name.clone());
                    true
                }
                Validation::Missing => {
                    report.missing_tables.push(name.clone());
                    tracing::warn!(table = %name, "Whitelisted table not found in database");
                    false
                }
                Validation::Unchecked => true,
            };

            let Some(schema) = static_source.get_table_schema(name) else {
                continue;
            };
            let document = static_document(schema, database_validated);
            let key = CacheKey::table_schema(name).into_static();
            self.cache.set(key.to_key_string(), document.into());
            if let Some(table) = key.table() {
                report.loaded_tables.push(table.to_string());
            }
        }

        let summary = static_source.get_summary();
        self.cache.set(
            CacheKey::schema_summary().into_static().to_key_string(),
            SummaryDocument {
                database_type: STATIC_DATABASE_TYPE.to_string(),
                tables: summary.total_tables,
                total_columns: Some(summary.total_columns),
                validated_tables: report.validated_tables.clone(),
                missing_tables: report.missing_tables.clone(),
                json_configs_loaded: Some(summary.json_configs_loaded),
                source: DocumentSource::JsonConfigSystem,
                ..SummaryDocument::default()
            }
            .into(),
        );

        self.cache
            .mark_static_preload_complete(&report.loaded_tables);

        if !report.missing_tables.is_empty() {
            tracing::warn!(
                missing = report.missing_tables.len(),
                tables = ?report.missing_tables,
                "Whitelisted tables missing from database"
            );
        }
        tracing::info!(
            loaded = report.loaded_tables.len(),
            validated = report.validated_tables.len(),
            "Preloaded static table schemas"
        );

        Some(report)
    }

    async fn validate_table(&self, table: &str) -> Validation {
        if !self.validate_static {
            return Validation::Unchecked;
        }
        match self.source.get_schema_info(Some(table)).await {
            Ok(_) => Validation::Validated,
            Err(SourceError::TableNotFound(_)) => Validation::Missing,
            Err(e) => {
                tracing::debug!(table = %table, error = %e, "Could not validate static table");
                Validation::Validated
            }
        }
    }

    /// Static preload followed by a parallel dynamic preload.
    ///
    /// At most `max_concurrency` table fetches are outstanding at any time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `max_concurrency` is zero. Table failures
    /// are reported, not returned.
    pub async fn preload_concurrent(&self, max_concurrency: usize) -> Result<PreloadReport> {
        if max_concurrency == 0 {
            return Err(Error::Config(
                "preload max_concurrency must be positive".into(),
            ));
        }
        Ok(self.run(max_concurrency).await)
    }

    /// Static preload followed by a one-table-at-a-time dynamic preload
    pub async fn preload_sequential(&self) -> PreloadReport {
        self.run(1).await
    }

    /// Load the configuration at `path`, then run [`preload_concurrent`].
    ///
    /// A malformed configuration is logged and preload continues with
    /// whatever configuration was already present.
    ///
    /// [`preload_concurrent`]: Self::preload_concurrent
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `max_concurrency` is zero.
    pub async fn load_and_preload(
        &self,
        path: impl AsRef<Path>,
        max_concurrency: usize,
    ) -> Result<PreloadReport> {
        if let Err(e) = self.load_configuration(path) {
            tracing::error!(error = %e, "Failed to load preload configuration");
        }
        self.preload_concurrent(max_concurrency).await
    }

    async fn run(&self, max_concurrency: usize) -> PreloadReport {
        let start = Instant::now();
        let mut report = PreloadReport {
            static_report: self.preload_static().await,
            ..PreloadReport::default()
        };

        let Some(config) = self.config() else {
            tracing::info!("No dynamic preload configuration found");
            report.elapsed = start.elapsed();
            return report;
        };

        if config.preload_overview {
            (report.overview_loaded, report.summary_loaded) = self.preload_overview().await;
        }

        let tables = config.tables_to_preload();
        if !tables.is_empty() {
            tracing::info!(
                tables = tables.len(),
                max_concurrency = max_concurrency,
                "Starting dynamic preload"
            );
        }

        let outcomes: Vec<(String, std::result::Result<(), SourceError>)> = stream::iter(tables)
            .map(|table| async move {
                let outcome = self.preload_table_schema(&table).await;
                (table, outcome)
            })
            .buffer_unordered(max_concurrency)
            .collect()
            .await;

        for (table, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(table),
                Err(e) => report.failed.push(TableFailure {
                    table,
                    error: e.to_string(),
                }),
            }
        }

        let dependency_outcomes: Vec<(String, std::result::Result<(), SourceError>)> =
            stream::iter(config.critical())
                .map(|table| async move {
                    let outcome = self.preload_table_dependencies(&table).await;
                    (table, outcome)
                })
                .buffer_unordered(max_concurrency)
                .collect()
                .await;

        for (table, outcome) in dependency_outcomes {
            match outcome {
                Ok(()) => report.dependencies_loaded += 1,
                Err(e) => report.dependency_failures.push(TableFailure {
                    table,
                    error: e.to_string(),
                }),
            }
        }

        self.cache.mark_dynamic_preload_complete(&report.succeeded);
        report.elapsed = start.elapsed();

        tracing::info!(
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            dependencies = report.dependencies_loaded,
            "Dynamic preload completed"
        );
        if !report.failed.is_empty() {
            let failed: Vec<&str> = report
                .failed
                .iter()
                .take(MAX_LOGGED_FAILURES)
                .map(|f| f.table.as_str())
                .collect();
            tracing::warn!(count = report.failed.len(), tables = ?failed, "Failed to preload tables");
        }

        report
    }

    async fn preload_overview(&self) -> (bool, bool) {
        let overview = match self.source.get_schema_info(None).await {
            Ok(doc) => {
                self.cache
                    .set(CacheKey::database_overview().to_key_string(), doc.into());
                tracing::debug!("Preloaded database overview");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to preload database overview");
                false
            }
        };

        let summary = match self.source.get_schema_summary().await {
            Ok(doc) => {
                self.cache
                    .set(CacheKey::schema_summary().to_key_string(), doc.into());
                tracing::debug!("Preloaded schema summary");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to preload schema summary");
                false
            }
        };

        (overview, summary)
    }

    async fn preload_table_schema(&self, table: &str) -> std::result::Result<(), SourceError> {
        let result = self.source.get_schema_info(Some(table)).await;

        #[cfg(feature = "metrics")]
        crate::observability::record_preload_table(result.is_ok());

        match result {
            Ok(doc) => {
                self.cache
                    .set(CacheKey::table_schema(table).to_key_string(), doc.into());
                tracing::debug!(table = %table, "Preloaded table schema");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Failed to preload table schema");
                Err(e)
            }
        }
    }

    async fn preload_table_dependencies(
        &self,
        table: &str,
    ) -> std::result::Result<(), SourceError> {
        match self.source.get_table_dependencies(table).await {
            Ok(doc) => {
                self.cache
                    .set(CacheKey::table_dependencies(table).to_key_string(), doc.into());
                tracing::debug!(table = %table, "Preloaded table dependencies");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Failed to preload table dependencies");
                Err(e)
            }
        }
    }
}

fn static_document(schema: StaticTableSchema, database_validated: bool) -> SchemaDocument {
    let annotations = StaticAnnotations {
        display_name: schema.display_name,
        category: schema.category,
        business_importance: schema.business_importance,
        relationships: schema.relationships,
        business_logic: schema.business_logic,
        ai_context: schema.ai_context,
        database_validated,
    };
    SchemaDocument::table(
        &schema.table_name,
        schema.columns,
        DocumentSource::JsonConfigSystem,
    )
    .with_annotations(annotations)
}
