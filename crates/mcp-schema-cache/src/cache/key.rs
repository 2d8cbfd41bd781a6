//! Cache key types and factory methods

use std::fmt;

use crate::constants::STATIC_TIER_SUFFIX;

/// Normalize a table name to the canonical (upper) case used in keys and
/// preload bookkeeping.
#[must_use]
pub fn normalize_table_name(table: &str) -> String {
    table.to_uppercase()
}

/// Document category, the leading segment of every key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Column list of a single table
    TableSchema,
    /// Foreign-key graph of a single table
    TableDependencies,
    /// List of all tables
    DatabaseOverview,
    /// Object counts for the whole database
    SchemaSummary,
}

impl CacheCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TableSchema => "table_schema",
            Self::TableDependencies => "table_dependencies",
            Self::DatabaseOverview => "database_overview",
            Self::SchemaSummary => "schema_summary",
        }
    }

    #[must_use]
    pub const fn is_table_scoped(&self) -> bool {
        matches!(self, Self::TableSchema | Self::TableDependencies)
    }
}

/// Cache tier a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheTier {
    /// Populated from live metadata queries
    #[default]
    Dynamic,
    /// Populated from authored configuration
    Static,
}

impl CacheTier {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Static => "static",
        }
    }
}

/// Structured cache key.
///
/// Renders as `{category}_{TABLE}` for table-scoped documents and as the bare
/// category for global ones, with `_static` appended in the static tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: CacheCategory,
    table: Option<String>,
    tier: CacheTier,
}

impl CacheKey {
    /// Create key for a table's column list
    #[must_use]
    pub fn table_schema(table: &str) -> Self {
        Self {
            category: CacheCategory::TableSchema,
            table: Some(normalize_table_name(table)),
            tier: CacheTier::Dynamic,
        }
    }

    /// Create key for a table's dependency graph
    #[must_use]
    pub fn table_dependencies(table: &str) -> Self {
        Self {
            category: CacheCategory::TableDependencies,
            table: Some(normalize_table_name(table)),
            tier: CacheTier::Dynamic,
        }
    }

    /// Create key for the table listing
    #[must_use]
    pub const fn database_overview() -> Self {
        Self {
            category: CacheCategory::DatabaseOverview,
            table: None,
            tier: CacheTier::Dynamic,
        }
    }

    /// Create key for the schema summary
    #[must_use]
    pub const fn schema_summary() -> Self {
        Self {
            category: CacheCategory::SchemaSummary,
            table: None,
            tier: CacheTier::Dynamic,
        }
    }

    /// Key for schema info: table-scoped when `table` is given, overview otherwise
    #[must_use]
    pub fn schema_info(table: Option<&str>) -> Self {
        table.map_or_else(Self::database_overview, Self::table_schema)
    }

    /// Same key in the static tier
    #[must_use]
    pub fn into_static(mut self) -> Self {
        self.tier = CacheTier::Static;
        self
    }

    #[must_use]
    pub const fn category(&self) -> CacheCategory {
        self.category
    }

    #[must_use]
    pub const fn tier(&self) -> CacheTier {
        self.tier
    }

    /// Normalized table name, if table-scoped
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Convert to string key for storage
    #[must_use]
    pub fn to_key_string(&self) -> String {
        let mut key = self.category.as_str().to_string();

        if let Some(ref table) = self.table {
            key.push('_');
            key.push_str(table);
        }

        if self.tier == CacheTier::Static {
            key.push_str(STATIC_TIER_SUFFIX);
        }

        key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key_string())
    }
}
