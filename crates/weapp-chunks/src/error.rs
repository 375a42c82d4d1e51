//! Sharing policy errors.

use thiserror::Error;

/// An error building a [`crate::SharingPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// An override `test` is neither a valid glob nor a valid `/regex/`.
    #[error("invalid override pattern `{test}`: {message}")]
    InvalidPattern {
        /// The pattern as written.
        test: String,
        /// What the pattern compiler reported.
        message: String,
    },
}
