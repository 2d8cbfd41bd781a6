//! Settings builder

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Error;
use crate::cache::CacheConfig;
use crate::constants::{
    DEFAULT_CACHE_TTL_MINUTES, DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_CONCURRENT_QUERIES,
    DEFAULT_SCHEMA_CONFIG_PATH, DEFAULT_STATIC_CONFIG_DIR,
};

/// Schema cache layer settings
#[derive(Debug, Clone)]
pub struct SchemaSettings {
    pub enable_cache: bool,
    pub cache: CacheConfig,
    pub preload_on_startup: bool,
    /// Preload JSON file, or a directory meaning "static whitelist only"
    pub schema_config_path: PathBuf,
    /// Authored schema directory
    pub static_config_dir: PathBuf,
    pub parallel_preload: bool,
    pub max_concurrent_queries: NonZeroUsize,
    pub strict_mode: bool,
    pub validate_static_tables: bool,
    pub logging: LoggingConfig,
}

impl SchemaSettings {
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    #[must_use]
    pub const fn cache_ttl_minutes(&self) -> u64 {
        self.cache.ttl().as_secs() / 60
    }

    #[must_use]
    pub fn schema_config_path(&self) -> &Path {
        &self.schema_config_path
    }

    #[must_use]
    pub fn static_config_dir(&self) -> &Path {
        &self.static_config_dir
    }
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache: CacheConfig::default(),
            preload_on_startup: true,
            schema_config_path: PathBuf::from(DEFAULT_SCHEMA_CONFIG_PATH),
            static_config_dir: PathBuf::from(DEFAULT_STATIC_CONFIG_DIR),
            parallel_preload: true,
            max_concurrent_queries: NonZeroUsize::MIN.saturating_add(DEFAULT_MAX_CONCURRENT_QUERIES - 1),
            strict_mode: false,
            validate_static_tables: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Settings builder with fluent API
#[derive(Debug)]
pub struct SettingsBuilder {
    enable_cache: bool,
    cache_ttl: Duration,
    max_cache_size: usize,
    preload_on_startup: bool,
    schema_config_path: PathBuf,
    static_config_dir: PathBuf,
    parallel_preload: bool,
    max_concurrent_queries: usize,
    strict_mode: bool,
    validate_static_tables: bool,
    log_level: String,
    json_logs: bool,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enable_cache: true,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_MINUTES * 60),
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            preload_on_startup: true,
            schema_config_path: PathBuf::from(DEFAULT_SCHEMA_CONFIG_PATH),
            static_config_dir: PathBuf::from(DEFAULT_STATIC_CONFIG_DIR),
            parallel_preload: true,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            strict_mode: false,
            validate_static_tables: true,
            log_level: String::new(),
            json_logs: false,
        }
    }

    #[must_use]
    pub const fn enable_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn cache_ttl_minutes(mut self, minutes: u64) -> Self {
        self.cache_ttl = Duration::from_secs(minutes.saturating_mul(60));
        self
    }

    #[must_use]
    pub const fn max_cache_size(mut self, size: usize) -> Self {
        self.max_cache_size = size;
        self
    }

    #[must_use]
    pub const fn preload_on_startup(mut self, enabled: bool) -> Self {
        self.preload_on_startup = enabled;
        self
    }

    #[must_use]
    pub fn schema_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_config_path = path.into();
        self
    }

    #[must_use]
    pub fn static_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_config_dir = dir.into();
        self
    }

    #[must_use]
    pub const fn parallel_preload(mut self, enabled: bool) -> Self {
        self.parallel_preload = enabled;
        self
    }

    #[must_use]
    pub const fn max_concurrent_queries(mut self, max: usize) -> Self {
        self.max_concurrent_queries = max;
        self
    }

    /// Never query the live source on a cache miss
    #[must_use]
    pub const fn strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self
    }

    #[must_use]
    pub const fn validate_static_tables(mut self, enabled: bool) -> Self {
        self.validate_static_tables = enabled;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Build the settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero TTL, zero cache size or zero
    /// preload concurrency.
    pub fn build(self) -> crate::Result<SchemaSettings> {
        let cache = CacheConfig::new(self.cache_ttl, self.max_cache_size)?;

        let max_concurrent_queries = NonZeroUsize::new(self.max_concurrent_queries)
            .ok_or_else(|| Error::Config("max_concurrent_queries must be positive".into()))?;

        let log_level = if self.log_level.is_empty() {
            "info".to_string()
        } else {
            self.log_level
        };

        Ok(SchemaSettings {
            enable_cache: self.enable_cache,
            cache,
            preload_on_startup: self.preload_on_startup,
            schema_config_path: self.schema_config_path,
            static_config_dir: self.static_config_dir,
            parallel_preload: self.parallel_preload,
            max_concurrent_queries,
            strict_mode: self.strict_mode,
            validate_static_tables: self.validate_static_tables,
            logging: LoggingConfig {
                log_level,
                json_logs: self.json_logs,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let settings = SettingsBuilder::new().build().unwrap();
        assert!(settings.enable_cache);
        assert_eq!(settings.cache_ttl_minutes(), 60);
        assert_eq!(settings.cache.max_size(), 1000);
        assert!(settings.preload_on_startup);
        assert_eq!(settings.schema_config_path(), Path::new("schema-config.json"));
        assert_eq!(settings.static_config_dir(), Path::new("schemas_config"));
        assert!(settings.parallel_preload);
        assert_eq!(settings.max_concurrent_queries.get(), 5);
        assert!(!settings.strict_mode);
        assert!(settings.validate_static_tables);
        assert_eq!(settings.logging.log_level, "info");
        assert!(!settings.logging.json_logs);
    }

    #[test]
    fn test_default_matches_builder() {
        let built = SettingsBuilder::new().build().unwrap();
        let default = SchemaSettings::default();
        assert_eq!(built.cache, default.cache);
        assert_eq!(built.max_concurrent_queries, default.max_concurrent_queries);
        assert_eq!(built.schema_config_path, default.schema_config_path);
    }

    #[test]
    fn test_builder_fluent() {
        let settings = SchemaSettings::builder()
            .enable_cache(false)
            .cache_ttl_minutes(5)
            .max_cache_size(50)
            .preload_on_startup(false)
            .schema_config_path("/etc/preload.json")
            .static_config_dir("/srv/schemas")
            .parallel_preload(false)
            .max_concurrent_queries(2)
            .strict_mode(true)
            .validate_static_tables(false)
            .log_level("debug")
            .json_logs(true)
            .build()
            .unwrap();

        assert!(!settings.enable_cache);
        assert_eq!(settings.cache.ttl(), Duration::from_secs(300));
        assert_eq!(settings.cache.max_size(), 50);
        assert!(!settings.preload_on_startup);
        assert_eq!(settings.schema_config_path(), Path::new("/etc/preload.json"));
        assert_eq!(settings.static_config_dir(), Path::new("/srv/schemas"));
        assert!(!settings.parallel_preload);
        assert_eq!(settings.max_concurrent_queries.get(), 2);
        assert!(settings.strict_mode);
        assert!(!settings.validate_static_tables);
        assert_eq!(settings.logging.log_level, "debug");
        assert!(settings.logging.json_logs);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let err = SettingsBuilder::new().cache_ttl_minutes(0).build().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_zero_cache_size_rejected() {
        let err = SettingsBuilder::new().max_cache_size(0).build().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = SettingsBuilder::new()
            .max_concurrent_queries(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_concurrent_queries"));
    }
}
