//! TOML settings file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::builder::SettingsBuilder;
use crate::Result;

/// Settings file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./mcp-schema-cache.toml",
    "~/.config/mcp-schema-cache/config.toml",
    "/etc/mcp-schema-cache/config.toml",
];

/// Find the first existing settings file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load settings from a TOML file
pub fn load_from_file(path: &Path, builder: SettingsBuilder) -> Result<SettingsBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(apply_file_config(builder, file_config))
}

fn apply_file_config(mut builder: SettingsBuilder, config: FileConfig) -> SettingsBuilder {
    if let Some(cache) = config.cache {
        if let Some(enabled) = cache.enabled {
            builder = builder.enable_cache(enabled);
        }

        if let Some(minutes) = cache.ttl_minutes {
            builder = builder.cache_ttl_minutes(minutes);
        }

        if let Some(size) = cache.max_size {
            builder = builder.max_cache_size(size);
        }

        if let Some(strict) = cache.strict_mode {
            builder = builder.strict_mode(strict);
        }
    }

    if let Some(preload) = config.preload {
        if let Some(on_startup) = preload.on_startup {
            builder = builder.preload_on_startup(on_startup);
        }

        if let Some(path) = preload.config_path {
            builder = builder.schema_config_path(path);
        }

        if let Some(dir) = preload.static_config_dir {
            builder = builder.static_config_dir(dir);
        }

        if let Some(parallel) = preload.parallel {
            builder = builder.parallel_preload(parallel);
        }

        if let Some(max) = preload.max_concurrent_queries {
            builder = builder.max_concurrent_queries(max);
        }

        if let Some(validate) = preload.validate_static {
            builder = builder.validate_static_tables(validate);
        }
    }

    if let Some(logging) = config.logging {
        if let Some(level) = logging.level {
            builder = builder.log_level(level);
        }

        if let Some(json) = logging.json {
            builder = builder.json_logs(json);
        }
    }

    builder
}

/// Root settings file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    cache: Option<CacheFileConfig>,
    preload: Option<PreloadFileConfig>,
    logging: Option<LoggingFileConfig>,
}

#[derive(Debug, Deserialize)]
struct CacheFileConfig {
    enabled: Option<bool>,
    ttl_minutes: Option<u64>,
    max_size: Option<usize>,
    strict_mode: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PreloadFileConfig {
    on_startup: Option<bool>,
    config_path: Option<PathBuf>,
    static_config_dir: Option<PathBuf>,
    parallel: Option<bool>,
    max_concurrent_queries: Option<usize>,
    validate_static: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct LoggingFileConfig {
    level: Option<String>,
    json: Option<bool>,
}
