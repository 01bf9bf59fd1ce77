//! Document validation engine

use std::sync::Arc;

use jsv_report::{ProcessingMessage, ProcessingReport, Severity};
use jsv_schema::{Error as SchemaError, SchemaLoader};
use serde_json::Value;
use tracing::trace;

use crate::structural::validate_structure;

/// Document field naming the schema the document claims to follow
pub const SCHEMA_KEYWORD: &str = "$schema";

/// Text of the message emitted for documents without `$schema`
pub const MISSING_SCHEMA: &str = "Missing $schema";

/// Validation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Collect every nested violation instead of stopping at the first
    pub deep_check: bool,
    /// Treat a missing `$schema` as an error rather than a warning
    pub require_schema: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            deep_check: true,
            require_schema: false,
        }
    }
}

impl ValidationConfig {
    #[must_use]
    pub fn deep_check(mut self, deep_check: bool) -> Self {
        self.deep_check = deep_check;
        self
    }

    #[must_use]
    pub fn require_schema(mut self, require_schema: bool) -> Self {
        self.require_schema = require_schema;
        self
    }
}

/// What a document declares in its `$schema` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredSchema<'a> {
    /// Absent or `null`
    Missing,
    /// Present but not a string; carries the JSON type name
    NotAString(&'static str),
    Reference(&'a str),
}

impl<'a> DeclaredSchema<'a> {
    /// Inspect a document's `$schema` field
    pub fn of(document: &'a Value) -> Self {
        match document.get(SCHEMA_KEYWORD) {
            None | Some(Value::Null) => DeclaredSchema::Missing,
            Some(Value::String(reference)) => DeclaredSchema::Reference(reference),
            Some(other) => DeclaredSchema::NotAString(json_type_name(other)),
        }
    }
}

/// Validates documents against the schema each one declares.
///
/// Every call produces exactly one report; failures to resolve or load the
/// schema become ERROR messages in that report rather than errors.
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    loader: Arc<SchemaLoader>,
    config: ValidationConfig,
}

impl DocumentValidator {
    /// Create a validator with the default configuration
    pub fn new(loader: Arc<SchemaLoader>) -> Self {
        Self::with_config(loader, ValidationConfig::default())
    }

    pub fn with_config(loader: Arc<SchemaLoader>, config: ValidationConfig) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> ValidationConfig {
        self.config
    }

    pub fn loader(&self) -> &SchemaLoader {
        &self.loader
    }

    /// Validate one document
    #[must_use]
    pub fn validate(&self, document: &Value) -> ProcessingReport {
        let mut report = ProcessingReport::new();

        let reference = match DeclaredSchema::of(document) {
            DeclaredSchema::Missing => {
                let severity = if self.config.require_schema {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                report.push(ProcessingMessage::new(severity, MISSING_SCHEMA));
                return report;
            }
            DeclaredSchema::NotAString(found) => {
                report.push(
                    ProcessingMessage::error(format!(
                        "Invalid $schema: expected a string, found {found}"
                    ))
                    .with_field("found", found),
                );
                return report;
            }
            DeclaredSchema::Reference(reference) => reference,
        };

        let uri = match self.loader.translator().resolve_reference(reference) {
            Ok(uri) => uri,
            Err(error) => {
                report.push(invalid_reference(reference, &error));
                return report;
            }
        };

        let schema = match self.loader.load(&uri) {
            Ok(schema) => schema,
            Err(error) => {
                report.push(schema_failure(&error));
                return report;
            }
        };

        trace!("Validating against {}", schema.uri());
        report.merge_with(validate_structure(&schema, document, self.config.deep_check));
        report
    }
}

fn invalid_reference(reference: &str, error: &SchemaError) -> ProcessingMessage {
    let reason = match error {
        SchemaError::UriSyntax { reason, .. } => reason.clone(),
        other => other.to_string(),
    };
    ProcessingMessage::error(format!("Invalid $schema URI '{reference}': {reason}"))
        .with_field("uri", reference)
}

fn schema_failure(error: &SchemaError) -> ProcessingMessage {
    let mut message = ProcessingMessage::error(error.to_string());
    if let Some(uri) = error.schema_uri() {
        message = message.with_field("schema", uri);
    }
    match error {
        SchemaError::Load { location, .. } => message
            .with_field("kind", "load")
            .with_field("location", location.as_str()),
        SchemaError::Parse { line, column, .. } => message
            .with_field("kind", "parse")
            .with_field("line", *line)
            .with_field("column", *column),
        SchemaError::SchemaSyntax { .. } => message.with_field("kind", "syntax"),
        SchemaError::Config(_) | SchemaError::UriSyntax { .. } => message,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
