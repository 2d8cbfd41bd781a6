//! Preload outcome reports

use std::time::Duration;

use serde::Serialize;

/// A table whose preload failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFailure {
    pub table: String,
    pub error: String,
}

/// Result of filling the static tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticPreloadReport {
    /// Tables written to the static tier
    pub loaded_tables: Vec<String>,
    /// Tables confirmed by the live source
    pub validated_tables: Vec<String>,
    /// Tables the live source reported missing, still cached
    pub missing_tables: Vec<String>,
}

/// Result of a full preload run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// `None` when no static source is configured
    pub static_report: Option<StaticPreloadReport>,
    pub overview_loaded: bool,
    pub summary_loaded: bool,
    pub succeeded: Vec<String>,
    pub failed: Vec<TableFailure>,
    pub dependencies_loaded: usize,
    pub dependency_failures: Vec<TableFailure>,
    pub elapsed: Duration,
}

impl PreloadReport {
    /// No table or dependency failed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.dependency_failures.is_empty()
    }

    /// Tables attempted in the dynamic phase
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = PreloadReport {
            succeeded: vec!["A".into(), "B".into()],
            failed: vec![TableFailure {
                table: "C".into(),
                error: "Table not found: C".into(),
            }],
            ..Default::default()
        };
        assert_eq!(report.attempted(), 3);
        assert!(!report.is_complete());
        assert!(PreloadReport::default().is_complete());
    }
}
