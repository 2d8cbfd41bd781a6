//! Composition root wiring settings, cache, introspector and preloader

use std::sync::Arc;

use serde::Serialize;

use crate::Result;
use crate::cache::{CacheStats, PreloadStatus, SchemaCache};
use crate::config::SchemaSettings;
use crate::introspector::CachedIntrospector;
use crate::preload::{PreloadReport, SchemaPreloader};
use crate::source::MetadataSource;
use crate::static_config::{FileSchemaConfig, StaticSchemaSource};
use crate::types::{
    DependencyDocument, LookupFailure, Outcome, Provenance, SchemaDocument, SummaryDocument,
    TaggedDocument,
};

/// Cache state reported to operators
#[derive(Debug, Clone, Serialize)]
pub struct CacheDiagnostics {
    pub enabled: bool,
    pub ttl_minutes: u64,
    pub max_size: usize,
    pub preload_enabled: bool,
    pub stats: CacheStats,
    pub preload_status: PreloadStatus,
    pub keys: Vec<String>,
}

/// Schema metadata service.
///
/// Owns the single cache shared by the introspector and the preloader.
pub struct SchemaService {
    settings: SchemaSettings,
    source: Arc<dyn MetadataSource>,
    cache: SchemaCache,
    introspector: CachedIntrospector,
    preloader: SchemaPreloader,
}

impl std::fmt::Debug for SchemaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaService")
            .field("settings", &self.settings)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SchemaService {
    /// Build the service.
    ///
    /// An unusable static configuration directory is logged and the service
    /// runs without a static tier.
    #[must_use]
    pub fn new(settings: SchemaSettings, source: Arc<dyn MetadataSource>) -> Self {
        let static_source = load_static_source(&settings);
        Self::with_static_source(settings, source, static_source)
    }

    /// Build the service around an explicit authored schema source
    #[must_use]
    pub fn with_static_source(
        settings: SchemaSettings,
        source: Arc<dyn MetadataSource>,
        static_source: Option<Arc<dyn StaticSchemaSource>>,
    ) -> Self {
        let cache = SchemaCache::new(settings.cache);
        let introspector =
            CachedIntrospector::new(Arc::clone(&source), cache.clone(), settings.strict_mode);

        let mut preloader = SchemaPreloader::new(cache.clone(), Arc::clone(&source))
            .with_static_validation(settings.validate_static_tables);
        if let Some(static_source) = static_source {
            preloader = preloader.with_static_source(static_source);
        }

        tracing::info!(
            enable_cache = settings.enable_cache,
            ttl_minutes = settings.cache_ttl_minutes(),
            max_size = settings.cache.max_size(),
            strict_mode = settings.strict_mode,
            "Schema service created"
        );

        Self {
            settings,
            source,
            cache,
            introspector,
            preloader,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &SchemaSettings {
        &self.settings
    }

    #[must_use]
    pub const fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    #[must_use]
    pub const fn preloader(&self) -> &SchemaPreloader {
        &self.preloader
    }

    /// Run the startup preload if enabled.
    ///
    /// Returns `None` when preloading on startup or the cache is disabled.
    /// A malformed preload configuration is logged and only the static tier
    /// is warmed.
    pub async fn startup(&self) -> Result<Option<PreloadReport>> {
        if !self.settings.enable_cache || !self.settings.preload_on_startup {
            tracing::info!("Startup preload disabled");
            return Ok(None);
        }

        if let Err(e) = self
            .preloader
            .load_configuration(self.settings.schema_config_path())
        {
            tracing::error!(error = %e, "Failed to load preload configuration");
        }
        self.preload().await.map(Some)
    }

    /// Re-read the preload configuration and preload again.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PreloadConfig`] for a malformed configuration,
    /// in which case nothing is preloaded.
    pub async fn reload(&self) -> Result<PreloadReport> {
        self.preloader
            .load_configuration(self.settings.schema_config_path())?;
        self.preload().await
    }

    async fn preload(&self) -> Result<PreloadReport> {
        if self.settings.parallel_preload {
            self.preloader
                .preload_concurrent(self.settings.max_concurrent_queries.get())
                .await
        } else {
            Ok(self.preloader.preload_sequential().await)
        }
    }

    pub async fn get_schema_info(&self, table: Option<&str>) -> Outcome<SchemaDocument> {
        if self.settings.enable_cache {
            return self.introspector.get_schema_info(table).await;
        }
        self.source
            .get_schema_info(table)
            .await
            .map(|doc| doc.with_provenance(Provenance::DatabaseQuery))
            .map_err(|e| LookupFailure::from_source(&e, table))
    }

    pub async fn get_table_dependencies(&self, table: &str) -> Outcome<DependencyDocument> {
        if self.settings.enable_cache {
            return self.introspector.get_table_dependencies(table).await;
        }
        self.source
            .get_table_dependencies(table)
            .await
            .map(|doc| doc.with_provenance(Provenance::DatabaseQuery))
            .map_err(|e| LookupFailure::from_source(&e, Some(table)))
    }

    pub async fn get_schema_summary(&self) -> Outcome<SummaryDocument> {
        if self.settings.enable_cache {
            return self.introspector.get_schema_summary().await;
        }
        self.source
            .get_schema_summary()
            .await
            .map(|doc| doc.with_provenance(Provenance::DatabaseQuery))
            .map_err(|e| LookupFailure::from_source(&e, None))
    }

    /// Drop cached entries for `table`, or the whole cache. Returns the
    /// number of entries removed.
    pub fn invalidate(&self, table: Option<&str>) -> usize {
        self.introspector.invalidate_cache(table)
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheDiagnostics {
        CacheDiagnostics {
            enabled: self.settings.enable_cache,
            ttl_minutes: self.settings.cache_ttl_minutes(),
            max_size: self.settings.cache.max_size(),
            preload_enabled: self.settings.preload_on_startup,
            stats: self.cache.stats(),
            preload_status: self.cache.preload_status(),
            keys: self.cache.keys(),
        }
    }
}

fn load_static_source(settings: &SchemaSettings) -> Option<Arc<dyn StaticSchemaSource>> {
    match FileSchemaConfig::load(settings.static_config_dir()) {
        Ok(config) if config.is_empty() => {
            tracing::info!(
                dir = %settings.static_config_dir().display(),
                "No static schema configuration found"
            );
            None
        }
        Ok(config) => {
            let source: Arc<dyn StaticSchemaSource> = Arc::new(config);
            Some(source)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load static schema configuration");
            None
        }
    }
}
