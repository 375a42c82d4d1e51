//! Entry resolution errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use weapp_config::ConfigError;

/// Result type for entry resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// A fatal entry resolution error.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A config file could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A required file of an entry does not exist.
    #[error("missing {what} for {entry}: {}", .path.display())]
    MissingEntry {
        /// The entry id.
        entry: String,
        /// The file that was expected.
        path: PathBuf,
        /// Which part of the entry is missing.
        what: &'static str,
    },

    /// A template or script could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The build was cancelled.
    #[error("build cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Create a missing-entry error.
    pub fn missing(entry: &str, path: PathBuf, what: &'static str) -> Self {
        Self::MissingEntry {
            entry: entry.to_string(),
            path,
            what,
        }
    }
}
