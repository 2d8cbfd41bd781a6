//! Startup preload of the schema cache

mod config;
mod preloader;
mod report;

pub use config::PreloadConfig;
pub use preloader::SchemaPreloader;
pub use report::{PreloadReport, StaticPreloadReport, TableFailure};
