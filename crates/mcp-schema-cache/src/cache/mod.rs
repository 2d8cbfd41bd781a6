//! Schema cache layer
//!
//! A bounded, thread-safe key→document store with TTL and a hybrid
//! frequency/recency eviction policy, plus preload bookkeeping.
//!
//! # Key Namespace
//!
//! Keys are `{category}_{TABLE}` for table-scoped documents and the bare
//! category for global ones. A `_static` suffix marks the static tier.
//! Table names are upper-cased before key construction on every path, so
//! `orders` and `ORDERS` share one entry.
//!
//! # Sharing
//!
//! [`CacheStore`] is a cheap handle. Clone it to share one cache between the
//! introspector, the preloader and diagnostics.
//!
//! # Staleness
//!
//! Expired entries are only removed when looked up. Entries written once and
//! never read again stay resident until evicted or cleared.

mod config;
mod key;
mod preload_status;
mod store;

pub use config::CacheConfig;
pub use key::{CacheCategory, CacheKey, CacheTier, normalize_table_name};
pub use preload_status::{PreloadStatus, TablePreloadState};
pub use store::{CacheStats, CacheStore};

use crate::types::Document;

/// Cache of schema metadata documents
pub type SchemaCache = CacheStore<Document>;
