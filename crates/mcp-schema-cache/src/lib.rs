//! Tiered schema metadata cache and preloader for MCP database servers

pub mod cache;
pub mod config;
mod constants;
mod error;
mod introspector;
pub mod observability;
pub mod preload;
mod service;
mod source;
pub mod static_config;
#[cfg(test)]
mod test_support;
pub mod types;

pub use cache::{CacheConfig, CacheKey, CacheStats, CacheStore, PreloadStatus, SchemaCache};
pub use config::{LoggingConfig, SchemaSettings, SettingsBuilder, load_settings};
pub use error::{Error, Result};
pub use introspector::CachedIntrospector;
pub use preload::{PreloadConfig, PreloadReport, SchemaPreloader, StaticPreloadReport};
pub use service::{CacheDiagnostics, SchemaService};
pub use source::{MetadataSource, SourceError};
pub use static_config::{FileSchemaConfig, StaticSchemaSource};
pub use types::*;
