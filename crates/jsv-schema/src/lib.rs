#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # jsv-schema
//!
//! Schema resolution for document validation.
//!
//! This crate turns the `$schema` reference declared by a document into a
//! compiled validator:
//!
//! 1. [`UriTranslator`] resolves the reference against a namespace root and
//!    rewrites it through the longest matching path redirect.
//! 2. A [`SchemaFetcher`] reads the schema text from the physical location.
//! 3. [`SchemaLoader`] syntax-checks and compiles the schema exactly once per
//!    logical URI and caches the result for the lifetime of the loader.

pub mod fetch;
pub mod loader;
pub mod translator;
pub mod uri;

pub use fetch::{FileFetcher, SchemaFetcher};
pub use loader::{CompiledSchema, LoaderOptions, SchemaLoader};
pub use translator::{UriMapping, UriTranslator, UriTranslatorBuilder};
pub use uri::parse_reference;

use thiserror::Error;

/// Errors that can occur while resolving and loading schemas.
///
/// The type is `Clone` so a failed load can be cached and replayed to every
/// later caller asking for the same URI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid redirect or namespace configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URI '{input}': {reason}")]
    UriSyntax { input: String, reason: String },

    /// The schema source could not be reached or read
    #[error("Cannot load schema '{uri}' from '{location}': {message}")]
    Load {
        uri: String,
        location: String,
        message: String,
    },

    /// The schema source is not well-formed JSON
    #[error("Malformed schema '{uri}' at line {line}, column {column}: {message}")]
    Parse {
        uri: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// The schema is JSON but not a valid schema
    #[error("Invalid schema '{uri}': {message}")]
    SchemaSyntax { uri: String, message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a URI syntax error for the original input text
    pub fn uri_syntax(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UriSyntax {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a load error with logical URI and physical location
    pub fn load(
        uri: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Load {
            uri: uri.into(),
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a schema syntax error
    pub fn schema_syntax(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaSyntax {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Logical schema URI the error is attributed to, if any
    pub fn schema_uri(&self) -> Option<&str> {
        match self {
            Self::Load { uri, .. } | Self::Parse { uri, .. } | Self::SchemaSyntax { uri, .. } => {
                Some(uri)
            }
            Self::Config(_) | Self::UriSyntax { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
