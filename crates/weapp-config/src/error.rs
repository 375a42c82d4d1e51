//! Configuration errors.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// An error reading or parsing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON once comments and trailing commas are
    /// removed, or does not have the expected shape.
    #[error("failed to parse {}:{line}:{column}: {message}", .path.display())]
    Parse {
        /// The file that was parsed.
        path: PathBuf,
        /// 1-indexed line of the error.
        line: usize,
        /// 1-indexed column of the error.
        column: usize,
        /// What went wrong.
        message: String,
    },
}

impl ConfigError {
    /// Create a read error.
    pub fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a parse error from a `serde_json` error.
    pub fn parse(path: &Path, err: &serde_json::Error) -> Self {
        let message = err.to_string();
        // serde_json appends " at line L column C" to its messages.
        let message = match message.rfind(" at line ") {
            Some(idx) => message[..idx].to_string(),
            None => message,
        };
        Self::Parse {
            path: path.to_path_buf(),
            line: err.line(),
            column: err.column(),
            message,
        }
    }

    /// The file this error originated from.
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }

    /// Whether the error is a read of a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
