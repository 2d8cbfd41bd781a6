//! Preload bookkeeping owned by the cache store

use std::collections::HashSet;
use std::time::SystemTime;

use serde::Serialize;

use super::key::normalize_table_name;

/// Mutable preload state, guarded by the store lock
#[derive(Debug, Default)]
pub(super) struct PreloadState {
    static_complete: bool,
    dynamic_complete: bool,
    static_tables: HashSet<String>,
    dynamic_tables: HashSet<String>,
    timestamp: Option<SystemTime>,
}

impl PreloadState {
    pub(super) fn mark_static<I, S>(&mut self, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.static_complete = true;
        self.static_tables = normalize_all(tables);
        self.timestamp = Some(SystemTime::now());
    }

    pub(super) fn mark_dynamic<I, S>(&mut self, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dynamic_complete = true;
        self.dynamic_tables = normalize_all(tables);
        self.timestamp = Some(SystemTime::now());
    }

    pub(super) fn snapshot(&self, cache_size: usize) -> PreloadStatus {
        PreloadStatus {
            static_complete: self.static_complete,
            dynamic_complete: self.dynamic_complete,
            static_count: self.static_tables.len(),
            dynamic_count: self.dynamic_tables.len(),
            total_count: self.static_tables.union(&self.dynamic_tables).count(),
            timestamp: self.timestamp,
            cache_size,
        }
    }

    pub(super) fn table_state(&self, table: &str) -> TablePreloadState {
        let table = normalize_table_name(table);
        let in_static = self.static_tables.contains(&table);
        let in_dynamic = self.dynamic_tables.contains(&table);
        TablePreloadState {
            in_static,
            in_dynamic,
            preloaded: in_static || in_dynamic,
        }
    }
}

fn normalize_all<I, S>(tables: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tables
        .into_iter()
        .map(|t| normalize_table_name(t.as_ref()))
        .collect()
}

/// Point-in-time view of preload progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadStatus {
    pub static_complete: bool,
    pub dynamic_complete: bool,
    pub static_count: usize,
    pub dynamic_count: usize,
    /// Size of the union of static and dynamic table sets
    pub total_count: usize,
    pub timestamp: Option<SystemTime>,
    pub cache_size: usize,
}

/// Which preload paths loaded a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TablePreloadState {
    pub in_static: bool,
    pub in_dynamic: bool,
    pub preloaded: bool,
}
