//! Constants for the schema cache layer

/// Default time-to-live of a cache entry in minutes
pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 60;

/// Default maximum number of live cache entries
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

/// Default bound on concurrent metadata fetches during preload
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 5;

/// Fraction of `max_size` evicted when a new key hits capacity
pub const EVICTION_FRACTION_DIVISOR: usize = 10;

/// Default preload configuration path
pub const DEFAULT_SCHEMA_CONFIG_PATH: &str = "schema-config.json";

/// Default authored schema directory
pub const DEFAULT_STATIC_CONFIG_DIR: &str = "schemas_config";

/// Key suffix of the static tier
pub const STATIC_TIER_SUFFIX: &str = "_static";

/// Hint attached to strict-mode denials of table-scoped lookups
pub const STRICT_MODE_TABLE_HINT: &str =
    "Only pre-configured tables in schemas_config/ are accessible in strict mode";

/// Hint attached to strict-mode denials of the schema summary
pub const STRICT_MODE_SUMMARY_HINT: &str =
    "Load schema configuration in schemas_config/ to enable strict mode access";

/// Label used for the global overview in denial messages
pub const OVERVIEW_LABEL: &str = "database overview";
