//! Error types and result aliases for benchrelay.
//!
//! This module defines the shared error types used across the runner and
//! collector. Errors are structured for programmatic handling and include
//! context for debugging.

/// The result type used throughout benchrelay.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in benchrelay operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The run-set configuration is invalid. Fatal to the runner; nothing
    /// is spawned once this is raised.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Packaging the artifact directory into an archive failed.
    #[error("archive error: {message}")]
    Archive {
        /// Description of the packaging failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new archive error with the given message.
    #[must_use]
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new archive error with a source cause.
    #[must_use]
    pub fn archive_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Archive {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
