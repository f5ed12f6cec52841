//! Error type shared by the core crate.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by response composition and the backing stores.
#[derive(Debug, Error)]
pub enum MotdError {
    /// The MOTD is enabled but the greeting list is empty.
    #[error("MOTD is enabled, but there are no greetings in the config file")]
    NoGreetings,

    /// No icon is loaded under the requested identifier.
    #[error("unknown icon: {0}")]
    IconNotFound(String),

    /// The configuration document could not be read or deserialized.
    #[error("invalid configuration: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Filesystem access failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// Path that was being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The filesystem watcher could not be installed.
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl MotdError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MotdError>;
