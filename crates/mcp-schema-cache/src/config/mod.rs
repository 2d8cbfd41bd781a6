//! Settings management
//!
//! Supports settings loading with precedence: env > file > defaults

mod builder;
mod env;
mod file;

pub use builder::{LoggingConfig, SchemaSettings, SettingsBuilder};

use crate::Result;

/// Load settings with precedence: env > file > defaults
pub fn load_settings() -> Result<SettingsBuilder> {
    let mut builder = SettingsBuilder::new();

    if let Some(path) = file::find_config_file() {
        tracing::info!("Loading settings from {}", path.display());
        builder = file::load_from_file(&path, builder)?;
    }

    Ok(env::load_from_env(builder))
}

/// Load settings from a specific file path, then apply the environment
pub fn load_settings_from_path(path: &std::path::Path) -> Result<SettingsBuilder> {
    let builder = file::load_from_file(path, SettingsBuilder::new())?;
    Ok(env::load_from_env(builder))
}
