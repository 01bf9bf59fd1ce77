//! Integration tests validating documents against schemas on disk

use std::fs;
use std::sync::Arc;

use jsv_report::Severity;
use jsv_schema::{SchemaLoader, UriMapping, UriTranslator};
use jsv_validation::{DocumentValidator, ValidationConfig};
use serde_json::json;

fn validator_for(schemas: &std::path::Path, config: ValidationConfig) -> DocumentValidator {
    let translator = UriTranslator::builder()
        .namespace_directory(schemas)
        .unwrap()
        .mapping(&UriMapping::new("http://schemas.example.com/", schemas))
        .unwrap()
        .freeze();
    DocumentValidator::with_config(Arc::new(SchemaLoader::new(translator)), config)
}

#[test]
fn document_satisfying_mapped_schema_passes() -> anyhow::Result<()> {
    let schemas = tempfile::tempdir()?;
    fs::write(
        schemas.path().join("invoice.json"),
        json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "required": ["number", "lines"],
            "properties": {
                "number": {"type": "string"},
                "lines": {"type": "array", "minItems": 1}
            }
        })
        .to_string(),
    )?;

    let validator = validator_for(schemas.path(), ValidationConfig::default());
    let report = validator.validate(&json!({
        "$schema": "http://schemas.example.com/invoice.json",
        "number": "INV-1",
        "lines": [{"sku": "A"}]
    }));

    assert!(report.is_success());
    assert_eq!(report.count(Severity::Error), 0);
    Ok(())
}

#[test]
fn document_violating_schema_reports_each_violation() -> anyhow::Result<()> {
    let schemas = tempfile::tempdir()?;
    fs::write(
        schemas.path().join("invoice.json"),
        json!({
            "type": "object",
            "required": ["number", "lines"],
            "properties": {"number": {"type": "string"}}
        })
        .to_string(),
    )?;

    let validator = validator_for(schemas.path(), ValidationConfig::default());
    let report = validator.validate(&json!({
        "$schema": "http://schemas.example.com/invoice.json",
        "number": 17
    }));

    assert!(!report.is_success());
    assert_eq!(report.count(Severity::Error), 2);
    Ok(())
}

#[test]
fn broken_schema_fails_every_referring_document() -> anyhow::Result<()> {
    let schemas = tempfile::tempdir()?;
    fs::write(
        schemas.path().join("broken.json"),
        r#"{"$schema": "http://json-schema.org/draft-07/schema#", "minLength": -1}"#,
    )?;

    let validator = validator_for(schemas.path(), ValidationConfig::default());
    let document = json!({"$schema": "http://schemas.example.com/broken.json"});

    let first = validator.validate(&document);
    let second = validator.validate(&document);

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    let message = &first.messages()[0];
    assert_eq!(message.severity, Severity::Error);
    assert_eq!(message.field("kind"), Some(&json!("syntax")));
    assert_eq!(
        message.field("schema"),
        Some(&json!("http://schemas.example.com/broken.json"))
    );
    Ok(())
}

#[test]
fn relative_schema_reference_resolves_against_namespace() -> anyhow::Result<()> {
    let schemas = tempfile::tempdir()?;
    fs::create_dir(schemas.path().join("types"))?;
    fs::write(
        schemas.path().join("types").join("tag.json"),
        r#"{"type": "object", "properties": {"label": {"type": "string"}}}"#,
    )?;

    let validator = validator_for(schemas.path(), ValidationConfig::default());
    let ok = validator.validate(&json!({"$schema": "types/tag.json", "label": "x"}));
    let bad = validator.validate(&json!({"$schema": "types/tag.json", "label": 1}));

    assert!(ok.is_success());
    assert!(!bad.is_success());
    Ok(())
}
