//! Environment variable loading for settings

use std::env;

use super::builder::SettingsBuilder;

/// Environment variable names
mod vars {
    pub const SCHEMA_ENABLE_CACHE: &str = "SCHEMA_ENABLE_CACHE";
    pub const SCHEMA_CACHE_TTL_MINUTES: &str = "SCHEMA_CACHE_TTL_MINUTES";
    pub const SCHEMA_MAX_CACHE_SIZE: &str = "SCHEMA_MAX_CACHE_SIZE";
    pub const SCHEMA_PRELOAD_ON_STARTUP: &str = "SCHEMA_PRELOAD_ON_STARTUP";
    pub const SCHEMA_CONFIG_PATH: &str = "SCHEMA_CONFIG_PATH";
    pub const SCHEMA_STATIC_CONFIG_DIR: &str = "SCHEMA_STATIC_CONFIG_DIR";
    pub const SCHEMA_PARALLEL_PRELOAD: &str = "SCHEMA_PARALLEL_PRELOAD";
    pub const SCHEMA_MAX_CONCURRENT_QUERIES: &str = "SCHEMA_MAX_CONCURRENT_QUERIES";
    pub const SCHEMA_STRICT_MODE: &str = "SCHEMA_STRICT_MODE";
    pub const SCHEMA_VALIDATE_STATIC: &str = "SCHEMA_VALIDATE_STATIC";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const SCHEMA_JSON_LOGS: &str = "SCHEMA_JSON_LOGS";
}

/// Apply settings from environment variables.
///
/// Unparsable numbers are ignored; zero values pass through and are rejected
/// by [`SettingsBuilder::build`].
pub fn load_from_env(mut builder: SettingsBuilder) -> SettingsBuilder {
    if let Ok(val) = env::var(vars::SCHEMA_ENABLE_CACHE) {
        builder = builder.enable_cache(parse_bool(&val));
    }

    if let Ok(ttl_str) = env::var(vars::SCHEMA_CACHE_TTL_MINUTES)
        && let Ok(minutes) = ttl_str.trim().parse::<u64>()
    {
        builder = builder.cache_ttl_minutes(minutes);
    }

    if let Ok(size_str) = env::var(vars::SCHEMA_MAX_CACHE_SIZE)
        && let Ok(size) = size_str.trim().parse::<usize>()
    {
        builder = builder.max_cache_size(size);
    }

    if let Ok(val) = env::var(vars::SCHEMA_PRELOAD_ON_STARTUP) {
        builder = builder.preload_on_startup(parse_bool(&val));
    }

    if let Ok(path) = env::var(vars::SCHEMA_CONFIG_PATH) {
        builder = builder.schema_config_path(path);
    }

    if let Ok(dir) = env::var(vars::SCHEMA_STATIC_CONFIG_DIR) {
        builder = builder.static_config_dir(dir);
    }

    if let Ok(val) = env::var(vars::SCHEMA_PARALLEL_PRELOAD) {
        builder = builder.parallel_preload(parse_bool(&val));
    }

    if let Ok(max_str) = env::var(vars::SCHEMA_MAX_CONCURRENT_QUERIES)
        && let Ok(max) = max_str.trim().parse::<usize>()
    {
        builder = builder.max_concurrent_queries(max);
    }

    if let Ok(val) = env::var(vars::SCHEMA_STRICT_MODE) {
        builder = builder.strict_mode(parse_bool(&val));
    }

    if let Ok(val) = env::var(vars::SCHEMA_VALIDATE_STATIC) {
        builder = builder.validate_static_tables(parse_bool(&val));
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::SCHEMA_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    builder
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
