//! Error types for the multisource system
//!
//! This module defines all error types used throughout the crate.

use crate::endpoint::Endpoint;
use std::fmt;
use thiserror::Error;

/// Result type alias for multisource operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the multisource system
#[derive(Error, Debug)]
pub enum Error {
    /// A single source failed to produce endpoints
    #[error("Source error ({name}): {message}")]
    Source {
        /// Source name
        name: String,
        /// Error message
        message: String,
    },

    /// Some sources failed; the endpoints of the healthy ones are carried along
    #[error(
        "Partial collection: {} source(s) failed, {} endpoint(s) collected: {}",
        .failures.len(),
        .endpoints.len(),
        FailureList(.failures)
    )]
    Partial {
        /// Endpoints collected from the sources that succeeded
        endpoints: Vec<Endpoint>,
        /// Every recorded source failure
        failures: Vec<SourceFailure>,
    },

    /// One or more sources failed during a collection
    #[error("{} source(s) failed: {}", .failures.len(), FailureList(.failures))]
    Collection {
        /// Every recorded source failure
        failures: Vec<SourceFailure>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (file-backed sources)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from remote sources)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller's cancellation token fired
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// A collection worker did not run to completion
    #[error("Worker failed: {0}")]
    Worker(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a source-attributed error
    pub fn source_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a worker error
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this error came from a cancelled token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Source failures carried by this error, if any
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            Self::Partial { failures, .. } | Self::Collection { failures } => failures,
            _ => &[],
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// A failure reported by one source during a collection
#[derive(Debug)]
pub struct SourceFailure {
    /// Name of the failing source
    pub source_name: String,
    /// What the source reported
    pub error: Error,
}

impl SourceFailure {
    /// Attribute an error to a source
    pub fn new(source_name: impl Into<String>, error: Error) -> Self {
        Self {
            source_name: source_name.into(),
            error,
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source_name, self.error)
    }
}

struct FailureList<'a>(&'a [SourceFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = Error::source_failed("file", "missing");
        assert_eq!(err.to_string(), "Source error (file): missing");
    }

    #[test]
    fn test_collection_error_lists_every_failure() {
        let err = Error::Collection {
            failures: vec![
                SourceFailure::new("a", Error::http("503")),
                SourceFailure::new("b", Error::cancelled("shutdown")),
            ],
        };

        assert_eq!(
            err.to_string(),
            "2 source(s) failed: a: HTTP error: 503; b: Cancelled: shutdown"
        );
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn test_partial_error_keeps_endpoints() {
        let err = Error::Partial {
            endpoints: vec![Endpoint::default()],
            failures: vec![SourceFailure::new("a", Error::other("boom"))],
        };

        assert!(err.to_string().starts_with("Partial collection: 1 source(s) failed, 1 endpoint(s)"));
        assert!(!err.is_cancelled());
    }
}
