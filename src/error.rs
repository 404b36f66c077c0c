// src/error.rs

use std::path::PathBuf;

/// Reasons a play request did not start a voice.
///
/// Neither variant is fatal to the pool: a failed request leaves the
/// available, active and background sets exactly as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    /// The clip was absent.
    #[error("cannot play an absent clip")]
    InvalidClip,

    /// No idle voice and growth is not allowed.
    #[error("voice pool exhausted ({active} active, capacity {capacity})")]
    PoolExhausted { active: usize, capacity: usize },
}

/// Result of a play request.
pub type PlayResult<T> = Result<T, PlayError>;

/// Error while loading or validating a `PoolConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
