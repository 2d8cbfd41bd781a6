//! Cache-aware facade over the metadata source
//!
//! Every lookup walks the same chain: dynamic tier, static tier, strict-mode
//! denial, live source. Documents written back from the live source land in
//! the dynamic tier only; the static tier is only written by preload.

use std::future::Future;
use std::sync::Arc;

use crate::cache::{CacheKey, CacheTier, SchemaCache};
use crate::constants::{OVERVIEW_LABEL, STRICT_MODE_SUMMARY_HINT, STRICT_MODE_TABLE_HINT};
use crate::source::{MetadataSource, SourceError};
use crate::types::{
    DependencyDocument, LookupFailure, Outcome, Provenance, SchemaDocument, SummaryDocument,
    TaggedDocument,
};

/// Tiered, cache-aware schema introspector.
///
/// In strict mode the live source is never queried; only cached tiers answer.
pub struct CachedIntrospector {
    cache: SchemaCache,
    source: Arc<dyn MetadataSource>,
    strict_mode: bool,
}

impl std::fmt::Debug for CachedIntrospector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedIntrospector")
            .field("cache", &self.cache)
            .field("strict_mode", &self.strict_mode)
            .finish_non_exhaustive()
    }
}

impl CachedIntrospector {
    #[must_use]
    pub fn new(source: Arc<dyn MetadataSource>, cache: SchemaCache, strict_mode: bool) -> Self {
        tracing::info!(strict_mode, "Schema introspector created");
        Self {
            cache,
            source,
            strict_mode,
        }
    }

    #[must_use]
    pub const fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    #[must_use]
    pub const fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Columns of `table`, or the table list when `table` is `None`
    pub async fn get_schema_info(&self, table: Option<&str>) -> Outcome<SchemaDocument> {
        let key = CacheKey::schema_info(table);
        if let Some(doc) = self.tiered_lookup(&key) {
            return Ok(doc);
        }

        if self.strict_mode {
            let label = key.table().unwrap_or(OVERVIEW_LABEL);
            return Err(self.deny(
                &key,
                format!(
                    "Schema access denied (Strict Mode): Table '{label}' not found in preloaded configuration"
                ),
                STRICT_MODE_TABLE_HINT,
            ));
        }

        self.fetch_and_store(&key, self.source.get_schema_info(key.table()))
            .await
    }

    /// Foreign keys of `table`.
    ///
    /// A static-tier schema authored with relationships answers ahead of the
    /// live source, even in strict mode.
    pub async fn get_table_dependencies(&self, table: &str) -> Outcome<DependencyDocument> {
        let key = CacheKey::table_dependencies(table);
        if let Some(doc) = self.tiered_lookup(&key) {
            return Ok(doc);
        }

        if let Some(doc) = self.dependencies_from_static(table) {
            self.cache.set(key.to_key_string(), doc.clone().into_document());
            tracing::debug!(
                cache.key = %key,
                "Derived dependencies from authored relationships"
            );
            return Ok(doc);
        }

        let label = key.table().unwrap_or(table);
        if self.strict_mode {
            return Err(self.deny(
                &key,
                format!(
                    "Dependency access denied (Strict Mode): Table '{label}' not found in preloaded configuration"
                ),
                STRICT_MODE_TABLE_HINT,
            ));
        }

        self.fetch_and_store(&key, self.source.get_table_dependencies(label))
            .await
    }

    pub async fn get_schema_summary(&self) -> Outcome<SummaryDocument> {
        let key = CacheKey::schema_summary();
        if let Some(doc) = self.tiered_lookup(&key) {
            return Ok(doc);
        }

        if self.strict_mode {
            return Err(self.deny(
                &key,
                "Schema summary denied (Strict Mode): No static configuration loaded".to_string(),
                STRICT_MODE_SUMMARY_HINT,
            ));
        }

        self.fetch_and_store(&key, self.source.get_schema_summary())
            .await
    }

    /// Drop cached entries for `table`, or everything when `None`.
    ///
    /// For a table this removes its dynamic schema, dynamic dependencies and
    /// static schema entries. Returns the number of entries removed.
    pub fn invalidate_cache(&self, table: Option<&str>) -> usize {
        let removed = match table {
            Some(table) => [
                CacheKey::table_schema(table),
                CacheKey::table_dependencies(table),
                CacheKey::table_schema(table).into_static(),
            ]
            .iter()
            .filter(|key| self.cache.invalidate(&key.to_key_string()))
            .count(),
            None => self.cache.clear(),
        };

        tracing::info!(
            table = table.unwrap_or("all entries"),
            removed,
            "Invalidated schema cache"
        );
        removed
    }

    fn tiered_lookup<T: TaggedDocument>(&self, key: &CacheKey) -> Option<T> {
        if let Some(doc) = self.tier_hit::<T>(key) {
            return Some(doc.with_default_provenance(Provenance::DynamicCache));
        }

        let static_key = key.clone().into_static();
        self.tier_hit::<T>(&static_key)
            .map(|doc| doc.with_provenance(Provenance::StaticCache))
    }

    fn tier_hit<T: TaggedDocument>(&self, key: &CacheKey) -> Option<T> {
        let doc = self
            .cache
            .get(&key.to_key_string())
            .and_then(T::from_document)?;

        tracing::debug!(
            cache.key = %key,
            cache.tier = key.tier().as_str(),
            cache.result = "hit",
            "Cache hit"
        );
        #[cfg(feature = "metrics")]
        crate::observability::record_cache_hit(key.tier().as_str());

        Some(doc)
    }

    fn dependencies_from_static(&self, table: &str) -> Option<DependencyDocument> {
        let static_key = CacheKey::table_schema(table).into_static();
        let schema = self
            .cache
            .get(&static_key.to_key_string())
            .and_then(SchemaDocument::from_document)?;
        let relationships = schema.static_relationships()?;
        Some(DependencyDocument::from_relationships(table, relationships))
    }

    fn deny(&self, key: &CacheKey, error: String, hint: &str) -> LookupFailure {
        tracing::warn!(
            cache.key = %key,
            strict_mode = self.strict_mode,
            "Strict mode blocked metadata lookup"
        );
        #[cfg(feature = "metrics")]
        crate::observability::record_strict_denial();

        LookupFailure::denied(error, key.table(), hint)
    }

    async fn fetch_and_store<T, Fut>(&self, key: &CacheKey, fetch: Fut) -> Outcome<T>
    where
        T: TaggedDocument,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        debug_assert_eq!(key.tier(), CacheTier::Dynamic);
        tracing::debug!(
            cache.key = %key,
            cache.result = "miss",
            "Querying metadata source"
        );
        #[cfg(feature = "metrics")]
        crate::observability::record_cache_miss();

        match fetch.await {
            Ok(doc) => {
                self.cache.set(key.to_key_string(), doc.clone().into_document());
                Ok(doc.with_provenance(Provenance::DatabaseQuery))
            }
            Err(e) => {
                tracing::warn!(cache.key = %key, error = %e, "Metadata query failed");
                Err(LookupFailure::from_source(&e, key.table()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::cache::CacheConfig;
    use crate::test_support::MockMetadataSource;
    use crate::types::{
        Document, DocumentSource, ForeignKey, Relationships, StaticAnnotations,
    };

    fn cache() -> SchemaCache {
        SchemaCache::new(CacheConfig::new(Duration::from_secs(3600), 100).unwrap())
    }

    fn introspector(
        source: &Arc<MockMetadataSource>,
        cache: &SchemaCache,
        strict_mode: bool,
    ) -> CachedIntrospector {
        CachedIntrospector::new(
            Arc::clone(source) as Arc<dyn MetadataSource>,
            cache.clone(),
            strict_mode,
        )
    }

    fn static_schema(table: &str, relationships: Relationships) -> Document {
        SchemaDocument::table(
            table,
            vec![json!({"COLUMN_NAME": "ID"})],
            DocumentSource::JsonConfigSystem,
        )
        .with_annotations(StaticAnnotations {
            display_name: table.to_string(),
            category: "sales".to_string(),
            business_importance: "high".to_string(),
            relationships,
            business_logic: json!({}),
            ai_context: json!({}),
            database_validated: true,
        })
        .into()
    }

    fn order_relationships() -> Relationships {
        Relationships {
            foreign_keys: vec![ForeignKey {
                column: "CUSTOMER_ID".to_string(),
                references: "CUSTOMERS.ID".to_string(),
                extra: serde_json::Map::new(),
            }],
            referenced_by: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_dynamic_hit_is_case_insensitive() {
        let source = Arc::new(MockMetadataSource::with_tables(&["TABLE_A"]));
        let cache = cache();
        cache.set(
            "table_schema_TABLE_A",
            SchemaDocument::table("TABLE_A", vec![], DocumentSource::Database).into(),
        );

        let doc = introspector(&source, &cache, false)
            .get_schema_info(Some("table_a"))
            .await
            .unwrap();

        assert_eq!(doc.cache_source, Some(Provenance::DynamicCache));
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_static_hit_not_written_to_dynamic_tier() {
        let source = Arc::new(MockMetadataSource::new());
        let cache = cache();
        cache.set(
            "table_schema_TABLE_B_static",
            static_schema("TABLE_B", Relationships::default()),
        );

        let doc = introspector(&source, &cache, false)
            .get_schema_info(Some("Table_B"))
            .await
            .unwrap();

        assert_eq!(doc.cache_source, Some(Provenance::StaticCache));
        assert_eq!(doc.source, DocumentSource::JsonConfigSystem);
        assert!(!cache.contains_key("table_schema_TABLE_B"));
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_mode_denies_without_source_call() {
        let source = Arc::new(MockMetadataSource::with_tables(&["TABLE_C"]));
        let cache = cache();

        let failure = introspector(&source, &cache, true)
            .get_schema_info(Some("table_c"))
            .await
            .unwrap_err();

        assert!(failure.strict_mode);
        assert!(failure.is_denied());
        assert!(failure.error.contains("TABLE_C"));
        assert_eq!(failure.hint.as_deref(), Some(STRICT_MODE_TABLE_HINT));
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_mode_overview_denial_label() {
        let source = Arc::new(MockMetadataSource::new());
        let failure = introspector(&source, &cache(), true)
            .get_schema_info(None)
            .await
            .unwrap_err();

        assert!(failure.error.contains("database overview"));
        assert!(failure.table_name.is_none());
    }

    #[tokio::test]
    async fn test_strict_mode_serves_static_tier() {
        let source = Arc::new(MockMetadataSource::new());
        let cache = cache();
        cache.set(
            "database_overview_static",
            SchemaDocument::overview(vec![json!({"TABLE_NAME": "A"})], DocumentSource::JsonConfigSystem)
                .into(),
        );

        let doc = introspector(&source, &cache, true)
            .get_schema_info(None)
            .await
            .unwrap();
        assert_eq!(doc.cache_source, Some(Provenance::StaticCache));
        assert_eq!(doc.total_count, 1);
    }

    #[tokio::test]
    async fn test_source_result_written_back() {
        let source = Arc::new(MockMetadataSource::with_tables(&["ORDERS"]));
        let cache = cache();
        let introspector = introspector(&source, &cache, false);

        let first = introspector.get_schema_info(Some("orders")).await.unwrap();
        assert_eq!(first.cache_source, Some(Provenance::DatabaseQuery));
        assert!(cache.contains_key("table_schema_ORDERS"));

        let second = introspector.get_schema_info(Some("ORDERS")).await.unwrap();
        assert_eq!(second.cache_source, Some(Provenance::DynamicCache));
        assert_eq!(second.results, first.results);
        assert_eq!(source.schema_calls(), 1);
    }

    #[tokio::test]
    async fn test_source_failure_not_cached() {
        let source = Arc::new(
            MockMetadataSource::new()
                .failing("BROKEN", SourceError::Connection("connection reset".into())),
        );
        let cache = cache();
        let introspector = introspector(&source, &cache, false);

        let failure = introspector
            .get_schema_info(Some("broken"))
            .await
            .unwrap_err();
        assert_eq!(failure.error, "Connection error: connection reset");
        assert!(!failure.strict_mode);
        assert!(cache.is_empty());

        let _ = introspector.get_schema_info(Some("broken")).await;
        assert_eq!(source.schema_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_refetched() {
        let source = Arc::new(MockMetadataSource::with_tables(&["ORDERS"]));
        let cache = SchemaCache::new(CacheConfig::new(Duration::from_secs(60), 100).unwrap());
        let introspector = introspector(&source, &cache, false);

        introspector.get_schema_info(Some("orders")).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let doc = introspector.get_schema_info(Some("orders")).await.unwrap();
        assert_eq!(doc.cache_source, Some(Provenance::DatabaseQuery));
        assert_eq!(source.schema_calls(), 2);
    }

    #[tokio::test]
    async fn test_dependencies_bridged_from_static_relationships() {
        let source = Arc::new(MockMetadataSource::new());
        let cache = cache();
        cache.set(
            "table_schema_ORDERS_static",
            static_schema("ORDERS", order_relationships()),
        );
        let introspector = introspector(&source, &cache, true);

        let doc = introspector.get_table_dependencies("orders").await.unwrap();
        assert_eq!(doc.cache_source, Some(Provenance::StaticCache));
        assert_eq!(doc.dependencies.len(), 1);
        assert_eq!(doc.dependencies[0].constraint_name, "FK_ORDERS_CUSTOMER_ID");
        assert_eq!(doc.dependencies[0].referenced_table, "CUSTOMERS");
        assert!(cache.contains_key("table_dependencies_ORDERS"));

        // Dynamic hit keeps the existing tag
        let again = introspector.get_table_dependencies("ORDERS").await.unwrap();
        assert_eq!(again.cache_source, Some(Provenance::StaticCache));
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_dependencies_without_relationships_denied_in_strict_mode() {
        let source = Arc::new(MockMetadataSource::with_tables(&["ORDERS"]));
        let cache = cache();
        cache.set(
            "table_schema_ORDERS_static",
            static_schema("ORDERS", Relationships::default()),
        );

        let failure = introspector(&source, &cache, true)
            .get_table_dependencies("orders")
            .await
            .unwrap_err();
        assert!(failure.error.contains("Dependency access denied"));
        assert_eq!(source.dependency_calls(), 0);
    }

    #[tokio::test]
    async fn test_dependencies_from_source() {
        let source = Arc::new(MockMetadataSource::with_tables(&["ORDERS"]));
        let cache = cache();
        let introspector = introspector(&source, &cache, false);

        let doc = introspector.get_table_dependencies("orders").await.unwrap();
        assert_eq!(doc.cache_source, Some(Provenance::DatabaseQuery));
        assert_eq!(doc.table_name, "ORDERS");

        let cached = introspector.get_table_dependencies("orders").await.unwrap();
        assert_eq!(cached.cache_source, Some(Provenance::DynamicCache));
        assert_eq!(source.dependency_calls(), 1);
    }

    #[tokio::test]
    async fn test_summary_tiers() {
        let source = Arc::new(MockMetadataSource::with_tables(&["A", "B"]));
        let cache = cache();
        let introspector = introspector(&source, &cache, false);

        let fresh = introspector.get_schema_summary().await.unwrap();
        assert_eq!(fresh.cache_source, Some(Provenance::DatabaseQuery));
        assert_eq!(fresh.tables, 2);

        cache.clear();
        cache.set(
            "schema_summary_static",
            SummaryDocument {
                tables: 7,
                source: DocumentSource::JsonConfigSystem,
                ..SummaryDocument::default()
            }
            .into(),
        );
        let from_static = introspector.get_schema_summary().await.unwrap();
        assert_eq!(from_static.cache_source, Some(Provenance::StaticCache));
        assert_eq!(from_static.tables, 7);
        assert_eq!(source.summary_calls(), 1);
    }

    #[tokio::test]
    async fn test_summary_strict_denial() {
        let source = Arc::new(MockMetadataSource::new());
        let failure = introspector(&source, &cache(), true)
            .get_schema_summary()
            .await
            .unwrap_err();

        assert_eq!(failure.hint.as_deref(), Some(STRICT_MODE_SUMMARY_HINT));
        assert_eq!(source.summary_calls(), 0);
    }

    #[tokio::test]
    async fn test_summary_failure_surfaced() {
        let source = Arc::new(
            MockMetadataSource::new().failing_summary(SourceError::Timeout(Duration::from_secs(30))),
        );
        let cache = cache();

        let failure = introspector(&source, &cache, false)
            .get_schema_summary()
            .await
            .unwrap_err();
        assert!(failure.error.contains("timed out"));
        assert!(!cache.contains_key("schema_summary"));
    }

    #[tokio::test]
    async fn test_invalidate_table() {
        let source = Arc::new(MockMetadataSource::new());
        let cache = cache();
        let doc: Document = SchemaDocument::table("X", vec![], DocumentSource::Database).into();
        for key in [
            "table_schema_ORDERS",
            "table_dependencies_ORDERS",
            "table_schema_ORDERS_static",
            "table_schema_CUSTOMERS",
        ] {
            cache.set(key, doc.clone());
        }

        let removed = introspector(&source, &cache, false).invalidate_cache(Some("orders"));

        assert_eq!(removed, 3);
        assert_eq!(cache.keys(), vec!["table_schema_CUSTOMERS".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let source = Arc::new(MockMetadataSource::new());
        let cache = cache();
        let doc: Document = SummaryDocument::default().into();
        cache.set("schema_summary", doc.clone());
        cache.set("schema_summary_static", doc);
        cache.mark_static_preload_complete(["A"]);

        let removed = introspector(&source, &cache, false).invalidate_cache(None);

        assert_eq!(removed, 2);
        assert!(cache.is_empty());
        assert!(cache.preload_status().static_complete);
    }
}
