//! Schema metadata documents and lookup outcomes

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::normalize_table_name;
use crate::source::SourceError;

/// Which path produced a returned document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    DynamicCache,
    StaticCache,
    DatabaseQuery,
    Denied,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DynamicCache => "dynamic_cache",
            Self::StaticCache => "static_cache",
            Self::DatabaseQuery => "database_query",
            Self::Denied => "denied",
        }
    }
}

/// Where document content originally came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// Live metadata query
    #[default]
    Database,
    /// Authored JSON configuration
    JsonConfigSystem,
}

/// Declared outgoing foreign key in authored configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    /// `TABLE.COLUMN`
    #[serde(default)]
    pub references: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ForeignKey {
    /// Split `references` into table and column; missing parts are empty
    #[must_use]
    pub fn referenced(&self) -> (&str, &str) {
        self.references
            .split_once('.')
            .unwrap_or((self.references.as_str(), ""))
    }
}

/// Authored relationship block of a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub referenced_by: Vec<Value>,
}

impl Relationships {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foreign_keys.is_empty() && self.referenced_by.is_empty()
    }
}

/// Business annotations carried by static-tier schema documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticAnnotations {
    pub display_name: String,
    pub category: String,
    pub business_importance: String,
    pub relationships: Relationships,
    pub business_logic: Value,
    pub ai_context: Value,
    /// `false` when the live database reported the table missing
    pub database_validated: bool,
}

/// Column list of one table, or the table list when `table_name` is absent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    pub table_name: Option<String>,
    pub results: Vec<Value>,
    pub total_count: usize,
    pub source: DocumentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_type: Option<String>,
    #[serde(flatten)]
    pub annotations: Option<StaticAnnotations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<Provenance>,
}

impl SchemaDocument {
    /// Column list for `table`
    #[must_use]
    pub fn table(table: &str, columns: Vec<Value>, source: DocumentSource) -> Self {
        Self {
            table_name: Some(normalize_table_name(table)),
            total_count: columns.len(),
            results: columns,
            source,
            database_type: None,
            annotations: None,
            cache_source: None,
        }
    }

    /// Database overview listing every table
    #[must_use]
    pub fn overview(tables: Vec<Value>, source: DocumentSource) -> Self {
        Self {
            table_name: None,
            total_count: tables.len(),
            results: tables,
            source,
            database_type: None,
            annotations: None,
            cache_source: None,
        }
    }

    #[must_use]
    pub fn with_database_type(mut self, database_type: impl Into<String>) -> Self {
        self.database_type = Some(database_type.into());
        self
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: StaticAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Authored relationships, if this document came from configuration
    #[must_use]
    pub fn static_relationships(&self) -> Option<&Relationships> {
        if self.source != DocumentSource::JsonConfigSystem {
            return None;
        }
        self.annotations
            .as_ref()
            .map(|a| &a.relationships)
            .filter(|r| !r.is_empty())
    }
}

/// One foreign-key edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub constraint_name: String,
    pub parent_table: String,
    pub parent_column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Foreign-key graph of one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyDocument {
    pub table_name: String,
    pub dependencies: Vec<Dependency>,
    pub source: DocumentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<Provenance>,
}

impl DependencyDocument {
    #[must_use]
    pub fn new(table: &str, dependencies: Vec<Dependency>, source: DocumentSource) -> Self {
        Self {
            table_name: normalize_table_name(table),
            dependencies,
            source,
            cache_source: None,
        }
    }

    /// Dependency list derived from authored foreign keys.
    ///
    /// Constraint names are synthesized as `FK_{TABLE}_{column}`. Incoming
    /// `referenced_by` entries are not dependencies and are ignored.
    #[must_use]
    pub fn from_relationships(table: &str, relationships: &Relationships) -> Self {
        let table = normalize_table_name(table);
        let dependencies = relationships
            .foreign_keys
            .iter()
            .map(|fk| {
                let (referenced_table, referenced_column) = fk.referenced();
                Dependency {
                    constraint_name: format!("FK_{table}_{}", fk.column),
                    parent_table: table.clone(),
                    parent_column: fk.column.clone(),
                    referenced_table: referenced_table.to_string(),
                    referenced_column: referenced_column.to_string(),
                }
            })
            .collect();

        Self {
            table_name: table,
            dependencies,
            source: DocumentSource::JsonConfigSystem,
            cache_source: Some(Provenance::StaticCache),
        }
    }
}

/// Object counts for the whole database
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryDocument {
    pub database_type: String,
    pub tables: usize,
    pub views: usize,
    pub procedures: usize,
    pub functions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_columns: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validated_tables: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_tables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_configs_loaded: Option<usize>,
    pub source: DocumentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<Provenance>,
}

/// Closed set of cacheable documents
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    Schema(SchemaDocument),
    Dependencies(DependencyDocument),
    Summary(SummaryDocument),
}

impl Document {
    #[must_use]
    pub const fn provenance(&self) -> Option<Provenance> {
        match self {
            Self::Schema(doc) => doc.cache_source,
            Self::Dependencies(doc) => doc.cache_source,
            Self::Summary(doc) => doc.cache_source,
        }
    }

    #[must_use]
    pub fn with_provenance(self, provenance: Provenance) -> Self {
        match self {
            Self::Schema(doc) => Self::Schema(doc.with_provenance(provenance)),
            Self::Dependencies(doc) => Self::Dependencies(doc.with_provenance(provenance)),
            Self::Summary(doc) => Self::Summary(doc.with_provenance(provenance)),
        }
    }
}

/// Provenance tagging for a concrete document variant
pub trait TaggedDocument: Sized + Clone {
    fn provenance(&self) -> Option<Provenance>;

    /// Return a copy tagged with `provenance`
    #[must_use]
    fn with_provenance(self, provenance: Provenance) -> Self;

    /// Tag only if not already tagged
    #[must_use]
    fn with_default_provenance(self, provenance: Provenance) -> Self {
        if self.provenance().is_some() {
            self
        } else {
            self.with_provenance(provenance)
        }
    }

    fn into_document(self) -> Document;

    /// Extract this variant; `None` when the document is another kind
    fn from_document(document: Document) -> Option<Self>;
}

macro_rules! tagged_document {
    ($ty:ty, $variant:ident) => {
        impl TaggedDocument for $ty {
            fn provenance(&self) -> Option<Provenance> {
                self.cache_source
            }

            fn with_provenance(mut self, provenance: Provenance) -> Self {
                self.cache_source = Some(provenance);
                self
            }

            fn into_document(self) -> Document {
                Document::$variant(self)
            }

            fn from_document(document: Document) -> Option<Self> {
                match document {
                    Document::$variant(doc) => Some(doc),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Document {
            fn from(doc: $ty) -> Self {
                Document::$variant(doc)
            }
        }
    };
}

tagged_document!(SchemaDocument, Schema);
tagged_document!(DependencyDocument, Dependencies);
tagged_document!(SummaryDocument, Summary);

/// Uniform failure document for denied or failed lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{error}")]
pub struct LookupFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub strict_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<Provenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl LookupFailure {
    /// Live source failure, error text kept verbatim
    #[must_use]
    pub fn from_source(err: &SourceError, table: Option<&str>) -> Self {
        Self {
            error: err.to_string(),
            table_name: table.map(normalize_table_name),
            strict_mode: false,
            cache_source: None,
            hint: None,
        }
    }

    /// Strict-mode refusal
    #[must_use]
    pub fn denied(error: String, table: Option<&str>, hint: &str) -> Self {
        Self {
            error,
            table_name: table.map(normalize_table_name),
            strict_mode: true,
            cache_source: Some(Provenance::Denied),
            hint: Some(hint.to_string()),
        }
    }

    #[must_use]
    pub fn is_denied(&self) -> bool {
        self.cache_source == Some(Provenance::Denied)
    }
}

/// Result of a tiered lookup
pub type Outcome<T> = std::result::Result<T, LookupFailure>;

/// Render an outcome as the JSON shape front-ends expect, with a `success` flag
pub fn outcome_to_json<T: Serialize>(outcome: &Outcome<T>) -> Value {
    let (success, rendered) = match outcome {
        Ok(doc) => (true, serde_json::to_value(doc)),
        Err(failure) => (false, serde_json::to_value(failure)),
    };

    let mut value = match rendered {
        Ok(value) => value,
        Err(e) => serde_json::json!({ "error": format!("Failed to serialize document: {e}") }),
    };
    if let Value::Object(map) = &mut value {
        map.insert("success".to_string(), Value::Bool(success));
    }
    value
}
