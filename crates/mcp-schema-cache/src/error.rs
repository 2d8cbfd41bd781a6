use thiserror::Error;

use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preload configuration error: {0}")]
    PreloadConfig(String),

    #[error("Static schema configuration error: {0}")]
    StaticConfig(String),

    #[error("Metadata source error: {0}")]
    Source(#[from] SourceError),
}

impl Error {
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_preload_config(&self) -> bool {
        matches!(self, Self::PreloadConfig(_))
    }

    #[must_use]
    pub const fn is_static_config(&self) -> bool {
        matches!(self, Self::StaticConfig(_))
    }

    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
