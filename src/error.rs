//! Error types for configuration, level loading and persistence.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::GameState;

/// Errors raised by the level lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// The catalog has no levels at all.
    #[error("level catalog is empty")]
    EmptyCatalog,

    /// A catalog entry exists but has no content to instantiate.
    #[error("level {index} has no content handle")]
    MissingContent { index: usize },

    /// No catalog entry carries the requested id.
    #[error("no level with id '{id}'")]
    NotFound { id: String },

    /// Two catalog entries share an id.
    #[error("duplicate level id '{id}'")]
    DuplicateId { id: String },
}

/// Errors raised while loading or validating session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level catalog: {0}")]
    Catalog(#[from] LevelError),

    #[error("rain interval must be positive, got {0}")]
    InvalidInterval(f32),

    #[error("rain duration must not be negative, got {0}")]
    NegativeDuration(f32),

    #[error("spawn bounds are inverted: min_x {min_x} > max_x {max_x}")]
    InvertedSpawnBounds { min_x: f32, max_x: f32 },

    #[error("grace period must not be negative, got {0}")]
    NegativeGracePeriod(f32),

    #[error("initial state must be Gameplay or Demo, got {0:?}")]
    InvalidInitialState(GameState),
}

/// Errors raised by file-backed stores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save file I/O on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("save file parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("save file version {0} unsupported")]
    UnsupportedVersion(u32),
}
