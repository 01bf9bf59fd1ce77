#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # jsv-validation
//!
//! Validation of JSON documents against the schema they declare.
//!
//! A document names its schema in its `$schema` field. The
//! [`DocumentValidator`] resolves that reference through the loader's URI
//! translator, loads (or reuses) the compiled schema, and runs structural
//! validation. The outcome is always a [`ProcessingReport`](jsv_report::ProcessingReport):
//!
//! | situation | report |
//! |---|---|
//! | no `$schema` | one `Missing $schema` message, WARNING (ERROR with `require_schema`) |
//! | malformed `$schema` URI | one ERROR |
//! | schema cannot be loaded, parsed, or checked | one ERROR |
//! | schema loaded | one ERROR per structural violation |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jsv_schema::{SchemaLoader, UriTranslator};
//! use jsv_validation::{DocumentValidator, ValidationConfig};
//!
//! let loader = SchemaLoader::new(UriTranslator::builder().freeze());
//! let validator = DocumentValidator::with_config(
//!     Arc::new(loader),
//!     ValidationConfig::default().require_schema(true),
//! );
//!
//! let report = validator.validate(&serde_json::json!({"name": "no schema"}));
//! assert!(!report.is_success());
//! ```

pub mod engine;
pub mod structural;

pub use engine::{
    DeclaredSchema, DocumentValidator, MISSING_SCHEMA, SCHEMA_KEYWORD, ValidationConfig,
};
pub use structural::validate_structure;
