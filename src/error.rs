//! Error types for the Vitrine library.
//!
//! All fallible operations return [`VitrineError`] through the crate-wide
//! [`Result`] alias. The loading, matrix and training stages surface these
//! errors to the caller; the recommendation query path never does and
//! degrades to the popularity ranking instead.
//!
//! # Examples
//!
//! ```
//! use vitrine::error::{Result, VitrineError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(VitrineError::malformed("expected a JSON array"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for Vitrine operations.
#[derive(Error, Debug)]
pub enum VitrineError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An input file does not exist.
    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// An input could not be decoded into the expected shape.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An input or derived table holds no usable data.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// A required field or column is absent.
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    /// Fewer users than the requested neighbor count.
    ///
    /// Training resolves this by lowering the neighbor count, so it is only
    /// ever rendered into a warning.
    #[error("Requested {requested} neighbors but only {available} users are available")]
    InsufficientUsers { requested: usize, available: usize },

    /// The queried user has no row in the user-item matrix.
    ///
    /// Answered with the popularity ranking rather than returned.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// Internal state turned out to be inconsistent while answering a query.
    #[error("Computation failure: {0}")]
    ComputationFailure(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error with stage context attached, rendered with its cause chain.
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with VitrineError.
pub type Result<T> = std::result::Result<T, VitrineError>;

impl VitrineError {
    /// Create a new source-not-found error.
    pub fn source_not_found<P: AsRef<Path>>(path: P) -> Self {
        VitrineError::SourceNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a new malformed input error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        VitrineError::MalformedInput(msg.into())
    }

    /// Create a new empty dataset error.
    pub fn empty<S: Into<String>>(msg: S) -> Self {
        VitrineError::EmptyDataset(msg.into())
    }

    /// Create a new missing field error.
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        VitrineError::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Create a new computation failure.
    pub fn computation<S: Into<String>>(msg: S) -> Self {
        VitrineError::ComputationFailure(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        VitrineError::InvalidOperation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = VitrineError::malformed("not an array");
        assert_eq!(error.to_string(), "Malformed input: not an array");

        let error = VitrineError::missing_field("purchase");
        assert_eq!(error.to_string(), "Missing required field: purchase");

        let error = VitrineError::InsufficientUsers {
            requested: 5,
            available: 3,
        };
        assert_eq!(
            error.to_string(),
            "Requested 5 neighbors but only 3 users are available"
        );
    }

    #[test]
    fn test_source_not_found_display() {
        let error = VitrineError::source_not_found("/tmp/missing.json");
        assert_eq!(error.to_string(), "Source not found: /tmp/missing.json");
    }

    #[test]
    fn test_context_keeps_cause() {
        use anyhow::Context;

        let result: Result<()> = Err(VitrineError::empty("no rows"));
        let error = VitrineError::from(result.context("Failed to create user-item matrix").unwrap_err());
        assert_eq!(
            error.to_string(),
            "Failed to create user-item matrix: Empty dataset: no rows"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let vitrine_error = VitrineError::from(io_error);

        match vitrine_error {
            VitrineError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
