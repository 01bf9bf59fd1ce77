//! Adapter over the schema engine's structural validation

use jsonschema::ValidationError;
use jsv_report::{ProcessingMessage, ProcessingReport};
use jsv_schema::CompiledSchema;
use serde_json::Value;

/// Validate `document` against `schema`, producing one ERROR message per
/// violation.
///
/// With `deep_check` every violation is collected; without it validation
/// stops at the first one.
#[must_use]
pub fn validate_structure(
    schema: &CompiledSchema,
    document: &Value,
    deep_check: bool,
) -> ProcessingReport {
    let validator = schema.validator();

    if deep_check {
        validator
            .iter_errors(document)
            .map(|error| violation(schema, &error))
            .collect()
    } else {
        match validator.validate(document) {
            Ok(()) => ProcessingReport::new(),
            Err(error) => std::iter::once(violation(schema, &error)).collect(),
        }
    }
}

fn violation(schema: &CompiledSchema, error: &ValidationError<'_>) -> ProcessingMessage {
    ProcessingMessage::error(error.to_string())
        .with_field("instance_path", error.instance_path.to_string())
        .with_field("schema_path", error.schema_path.to_string())
        .with_field("schema", schema.uri().as_str())
}
