//! Live metadata source seam

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{DependencyDocument, SchemaDocument, SummaryDocument};

/// Failure reported by a live metadata query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Metadata query failed: {0}")]
    Query(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Metadata query timed out after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    #[must_use]
    pub const fn is_table_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound(_))
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Live source of schema metadata.
///
/// Every call may suspend on a database round-trip. Timeouts and retries
/// belong to the implementation; failures are returned, never cached.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Columns of `table`, or the list of all tables when `table` is `None`
    async fn get_schema_info(&self, table: Option<&str>) -> Result<SchemaDocument, SourceError>;

    /// Foreign keys declared on `table`
    async fn get_table_dependencies(&self, table: &str)
    -> Result<DependencyDocument, SourceError>;

    /// Object counts for the whole database
    async fn get_schema_summary(&self) -> Result<SummaryDocument, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        assert_eq!(
            SourceError::TableNotFound("ORDERS".to_string()).to_string(),
            "Table not found: ORDERS"
        );
        assert!(
            SourceError::Timeout(Duration::from_secs(3))
                .to_string()
                .contains("3s")
        );
    }

    #[test]
    fn test_source_error_predicates() {
        assert!(SourceError::TableNotFound("X".to_string()).is_table_not_found());
        assert!(!SourceError::Query("bad".to_string()).is_table_not_found());
        assert!(SourceError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!SourceError::Connection("refused".to_string()).is_timeout());
    }
}
