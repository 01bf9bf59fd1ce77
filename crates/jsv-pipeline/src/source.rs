//! Reading candidate documents

use std::path::Path;

use serde_json::Value;

use crate::{Error, Result};

/// A parsed input document
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Identifier used in logs, normally the path relative to the source
    /// directory
    pub id: String,
    pub content: Value,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, content: Value) -> Self {
        Self {
            id: id.into(),
            content,
        }
    }
}

/// Read and parse the document at `path`, reporting errors under `id`
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Parse`]
/// with the failing line and column when it is not well-formed JSON.
pub fn read_document(id: &str, path: &Path) -> Result<SourceDocument> {
    let bytes = std::fs::read(path).map_err(|e| Error::io("read", id, e.to_string()))?;
    let content = serde_json::from_slice(&bytes)
        .map_err(|e| Error::parse(id, e.line(), e.column(), e.to_string()))?;
    Ok(SourceDocument::new(id, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        std::fs::write(&path, r#"{"$schema": "s.json", "n": 1}"#).unwrap();

        let document = read_document("a.json", &path).unwrap();
        assert_eq!(document.id, "a.json");
        assert_eq!(document.content, json!({"$schema": "s.json", "n": 1}));
    }

    #[test]
    fn test_malformed_document_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\n  \"a\": 1,\n  \"b\": }\n").unwrap();

        match read_document("bad.json", &path).unwrap_err() {
            Error::Parse {
                path, line, column, ..
            } => {
                assert_eq!(path, "bad.json");
                assert_eq!(line, 3);
                assert!(column > 0);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_document("gone.json", Path::new("/nonexistent/gone.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.document(), Some("gone.json"));
    }
}
