#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # jsv-pipeline
//!
//! Batch orchestration over a directory of JSON documents.
//!
//! This crate wires the pieces together: it discovers candidate files,
//! parses them, validates each one against the schema it declares through a
//! shared [`SchemaLoader`](jsv_schema::SchemaLoader), and forwards every
//! message to a [`LogSink`]. One bad file never stops the batch; the
//! aggregate outcome is reported once at the end.
//!
//! ```no_run
//! use jsv_pipeline::{BatchValidator, ValidateConfig};
//!
//! let config = ValidateConfig::new("documents")
//!     .mapping("http://schemas.example.com/", "schemas");
//! let result = BatchValidator::new(config)?.validate_source_directory()?;
//! println!("{}", result.stats);
//! # Ok::<(), jsv_pipeline::Error>(())
//! ```

pub mod batch;
pub mod config;
pub mod discovery;
pub mod sink;
pub mod source;

pub use batch::{BatchResult, BatchStats, BatchValidator, DocumentOutcome};
pub use config::ValidateConfig;
pub use discovery::{DiscoveredFile, FileDiscovery, PathPattern};
pub use sink::{LogSink, TracingSink};
pub use source::{SourceDocument, read_document};

use thiserror::Error;

/// Errors that can occur while running a batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Setup failure; aborts the run before any document is processed
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },

    #[error("Malformed document '{path}' at line {line}, column {column}: {message}")]
    Parse {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Validation failed for {failed} of {total} document(s)")]
    ValidationFailed { failed: usize, total: usize },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a structured I/O error with operation/path context.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn parse(
        path: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Identifier of the document this error belongs to, if any
    pub fn document(&self) -> Option<&str> {
        match self {
            Error::Io { path, .. } | Error::Parse { path, .. } => Some(path),
            Error::Config(_) | Error::ValidationFailed { .. } => None,
        }
    }
}

impl From<jsv_schema::Error> for Error {
    fn from(e: jsv_schema::Error) -> Self {
        match e {
            jsv_schema::Error::Config(message) => Error::Config(message),
            other => Error::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_preserves_operation_and_path_context() {
        let error = Error::io("read", "orders/a.json", "permission denied");
        match &error {
            Error::Io {
                operation,
                path,
                message,
            } => {
                assert_eq!(operation, "read");
                assert_eq!(path, "orders/a.json");
                assert_eq!(message, "permission denied");
            }
            _ => panic!("expected io variant"),
        }
        assert_eq!(error.document(), Some("orders/a.json"));
    }

    #[test]
    fn parse_error_reports_position() {
        let error = Error::parse("a.json", 3, 14, "expected value");
        assert_eq!(
            error.to_string(),
            "Malformed document 'a.json' at line 3, column 14: expected value"
        );
    }

    #[test]
    fn schema_errors_become_configuration_errors() {
        let error = Error::from(jsv_schema::Error::config("URI x must not contain a fragment"));
        assert_eq!(
            error.to_string(),
            "Configuration error: URI x must not contain a fragment"
        );
        assert!(error.document().is_none());
    }
}
