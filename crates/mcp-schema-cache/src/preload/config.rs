//! Preload configuration file

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::cache::normalize_table_name;
use crate::constants::DEFAULT_CACHE_TTL_MINUTES;
use crate::error::{Error, Result};

/// Which live metadata to warm at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Preload the table list and schema summary
    #[serde(default = "default_preload_overview")]
    pub preload_overview: bool,
    /// Best-effort table schemas
    #[serde(default)]
    pub preload_tables: Vec<String>,
    /// Table schemas plus their dependency graphs
    #[serde(default)]
    pub critical_tables: Vec<String>,
}

const fn default_preload_overview() -> bool {
    true
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            preload_overview: default_preload_overview(),
            preload_tables: Vec::new(),
            critical_tables: Vec::new(),
        }
    }
}

impl PreloadConfig {
    /// Read the configuration at `path`.
    ///
    /// Returns `Ok(None)` when the path does not exist or is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreloadConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Preload configuration not found");
            return Ok(None);
        }
        if path.is_dir() {
            tracing::debug!(
                path = %path.display(),
                "Preload configuration path is a directory, relying on static whitelist"
            );
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::PreloadConfig(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&content)?;

        tracing::info!(
            path = %path.display(),
            preload_tables = config.preload_tables.len(),
            critical_tables = config.critical_tables.len(),
            "Loaded preload configuration"
        );
        Ok(Some(config))
    }

    /// # Errors
    ///
    /// Returns [`Error::PreloadConfig`] on malformed JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::PreloadConfig(format!("Failed to parse preload configuration: {e}")))
    }

    /// Union of `preload_tables` and `critical_tables`, normalized, first
    /// occurrence order kept
    #[must_use]
    pub fn tables_to_preload(&self) -> Vec<String> {
        dedup_normalized(self.preload_tables.iter().chain(&self.critical_tables))
    }

    /// Normalized critical tables without duplicates
    #[must_use]
    pub fn critical(&self) -> Vec<String> {
        dedup_normalized(&self.critical_tables)
    }

    /// Sample document for operators to fill in
    #[must_use]
    pub fn sample() -> Value {
        json!({
            "preload_overview": true,
            "preload_tables": [],
            "critical_tables": [],
            "cache_ttl_minutes": DEFAULT_CACHE_TTL_MINUTES,
            "description": "Schema preload configuration. List the tables to warm at startup.",
            "usage_note": "preload_tables are loaded best-effort; critical_tables also preload their dependencies"
        })
    }

    /// Write [`sample`](Self::sample) to `path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreloadConfig`] if the file cannot be written.
    pub fn write_sample(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&Self::sample())
            .map_err(|e| Error::PreloadConfig(e.to_string()))?;
        fs::write(path, content).map_err(|e| {
            Error::PreloadConfig(format!("Failed to write {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), "Wrote sample preload configuration");
        Ok(())
    }
}

fn dedup_normalized<'a>(tables: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tables
        .into_iter()
        .map(|t| normalize_table_name(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
