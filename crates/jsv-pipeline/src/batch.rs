//! Batch orchestration
//!
//! [`BatchValidator`] owns one schema cache for its whole lifetime and
//! validates documents one after another. Read and parse failures of an
//! individual document are recorded against that document and never abort
//! the batch; only setup errors are fatal.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsv_report::{ProcessingMessage, ProcessingReport, Severity};
use jsv_schema::{FileFetcher, SchemaFetcher, SchemaLoader, UriTranslator};
use jsv_validation::DocumentValidator;
use tracing::{debug, info};

use crate::discovery::FileDiscovery;
use crate::sink::{LogSink, TracingSink};
use crate::source::{SourceDocument, read_document};
use crate::{Error, Result, ValidateConfig};

/// Outcome for a single document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    pub id: String,
    /// The validation report, or the error that kept the document from being
    /// validated at all
    pub result: std::result::Result<ProcessingReport, Error>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.result.as_ref().is_ok_and(ProcessingReport::is_success)
    }
}

/// Counters over a batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Documents seen, including unreadable ones
    pub documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// ERROR and FATAL messages plus read/parse failures
    pub errors: usize,
    pub warnings: usize,
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validated {} document(s): {} passed, {} failed ({} error(s), {} warning(s))",
            self.documents, self.succeeded, self.failed, self.errors, self.warnings
        )
    }
}

/// Result of validating a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// True when every document was read and its report succeeded
    pub success: bool,
    pub outcomes: Vec<DocumentOutcome>,
    pub stats: BatchStats,
    pub duration: Duration,
}

impl Default for BatchResult {
    fn default() -> Self {
        Self {
            success: true,
            outcomes: Vec::new(),
            stats: BatchStats::default(),
            duration: Duration::ZERO,
        }
    }
}

impl BatchResult {
    fn record(&mut self, outcome: DocumentOutcome) {
        self.stats.documents += 1;
        match &outcome.result {
            Ok(report) => {
                self.stats.errors += report.iter().filter(|m| m.is_failure()).count();
                self.stats.warnings += report.count(Severity::Warning);
            }
            Err(_) => self.stats.errors += 1,
        }
        if outcome.is_success() {
            self.stats.succeeded += 1;
        } else {
            self.stats.failed += 1;
            self.success = false;
        }
        self.outcomes.push(outcome);
    }

    /// Identifiers of the documents that failed
    pub fn failed_documents(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.id.as_str())
    }

    /// Turn the aggregate outcome into the caller's success signal
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationFailed`] if any document failed.
    pub fn into_result(self) -> Result<BatchStats> {
        if self.success {
            Ok(self.stats)
        } else {
            Err(Error::ValidationFailed {
                failed: self.stats.failed,
                total: self.stats.documents,
            })
        }
    }
}

/// Validates batches of documents against the schemas they declare
pub struct BatchValidator {
    config: ValidateConfig,
    validator: DocumentValidator,
    sink: Arc<dyn LogSink>,
}

impl BatchValidator {
    /// Create a validator reading schemas from disk
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid schema mapping or a source
    /// directory that cannot serve as the namespace root.
    pub fn new(config: ValidateConfig) -> Result<Self> {
        Self::with_fetcher(config, Arc::new(FileFetcher))
    }

    /// Create a validator using a custom schema fetcher
    ///
    /// # Errors
    ///
    /// See [`BatchValidator::new`].
    pub fn with_fetcher(config: ValidateConfig, fetcher: Arc<dyn SchemaFetcher>) -> Result<Self> {
        let translator = UriTranslator::builder()
            .namespace_directory(&config.source_directory)?
            .mappings(&config.schema_mappings)?
            .freeze();
        debug!(
            "Namespace {:?} with {} redirect(s)",
            translator.namespace().map(url::Url::as_str),
            translator.redirects().count()
        );

        let loader =
            SchemaLoader::with_fetcher(translator, fetcher).with_options(config.loader_options());
        let validator =
            DocumentValidator::with_config(Arc::new(loader), config.validation_config());

        Ok(Self {
            config,
            validator,
            sink: Arc::new(TracingSink),
        })
    }

    /// Send per-document messages to `sink` instead of `tracing`
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ValidateConfig {
        &self.config
    }

    pub fn validator(&self) -> &DocumentValidator {
        &self.validator
    }

    /// Discovery over the configured source directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the source directory is missing or a
    /// pattern is invalid.
    pub fn discovery(&self) -> Result<FileDiscovery> {
        FileDiscovery::new(
            &self.config.source_directory,
            &self.config.includes,
            &self.config.excludes,
        )
    }

    /// Discover, read and validate every selected file
    ///
    /// # Errors
    ///
    /// Only setup errors are returned; per-document failures are recorded in
    /// the [`BatchResult`].
    pub fn validate_source_directory(&self) -> Result<BatchResult> {
        let discovery = self.discovery()?;
        let documents = discovery
            .files()
            .map(|file| file.and_then(|f| read_document(&f.id, &f.path)));
        Ok(self.run(documents))
    }

    /// Validate a sequence of documents in order. Items that failed to be
    /// read or parsed count as failed documents.
    pub fn run<I>(&self, documents: I) -> BatchResult
    where
        I: IntoIterator<Item = Result<SourceDocument>>,
    {
        let start = Instant::now();
        let mut result = BatchResult::default();

        for item in documents {
            let outcome = match item {
                Ok(document) => self.validate_document(document),
                Err(error) => {
                    let id = error.document().unwrap_or("<unknown>").to_string();
                    self.sink.log(&id, Severity::Error, &error.to_string());
                    DocumentOutcome {
                        id,
                        result: Err(error),
                    }
                }
            };
            result.record(outcome);
        }

        result.duration = start.elapsed();
        info!("{}", result.stats);
        result
    }

    fn validate_document(&self, document: SourceDocument) -> DocumentOutcome {
        info!("Validating {}", document.id);
        let report = self.validator.validate(&document.content);
        for message in &report {
            self.forward(&document.id, message);
        }
        DocumentOutcome {
            id: document.id,
            result: Ok(report),
        }
    }

    fn forward(&self, id: &str, message: &ProcessingMessage) {
        if message.severity == Severity::None {
            return;
        }
        match message.field("instance_path").and_then(|v| v.as_str()) {
            Some(path) if !path.is_empty() => {
                let text = format!("{} (at {path})", message.message);
                self.sink.log(id, message.severity, &text);
            }
            _ => self.sink.log(id, message.severity, &message.message),
        }
    }
}

impl fmt::Debug for BatchValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchValidator")
            .field("config", &self.config)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<(String, Severity, String)>>,
    }

    impl RecordingSink {
        fn lines(&self) -> Vec<(String, Severity, String)> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl LogSink for RecordingSink {
        fn log(&self, identifier: &str, severity: Severity, text: &str) {
            self.lines
                .lock()
                .unwrap()
                .push((identifier.to_string(), severity, text.to_string()));
        }
    }

    fn batch(config: ValidateConfig) -> (BatchValidator, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let validator = BatchValidator::new(config)
            .unwrap()
            .with_sink(sink.clone());
        (validator, sink)
    }

    #[test]
    fn test_missing_schema_is_warning_and_success() {
        let dir = tempfile::tempdir().unwrap();
        let (validator, sink) = batch(ValidateConfig::new(dir.path()));

        let result = validator.run([Ok(SourceDocument::new("a.json", json!({"x": 1})))]);

        assert!(result.success);
        assert_eq!(result.stats.warnings, 1);
        assert_eq!(
            sink.lines(),
            vec![(
                "a.json".to_string(),
                Severity::Warning,
                "Missing $schema".to_string()
            )]
        );
    }

    #[test]
    fn test_required_schema_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let (validator, _) = batch(ValidateConfig::new(dir.path()).require_schema(true));

        let result = validator.run([
            Ok(SourceDocument::new("a.json", json!({}))),
            Ok(SourceDocument::new("b.json", json!({}))),
        ]);

        assert!(!result.success);
        assert_eq!(result.stats.failed, 2);
        assert_eq!(result.failed_documents().collect::<Vec<_>>(), ["a.json", "b.json"]);
        assert_eq!(
            result.into_result(),
            Err(Error::ValidationFailed {
                failed: 2,
                total: 2
            })
        );
    }

    #[test]
    fn test_read_failure_counts_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let (validator, sink) = batch(ValidateConfig::new(dir.path()));

        let result = validator.run([
            Err(Error::parse("broken.json", 1, 2, "expected value")),
            Ok(SourceDocument::new("ok.json", json!({}))),
        ]);

        assert!(!result.success);
        assert_eq!(result.stats.documents, 2);
        assert_eq!(result.stats.failed, 1);
        assert_eq!(result.stats.succeeded, 1);
        assert_eq!(result.stats.errors, 1);
        let lines = sink.lines();
        assert_eq!(lines[0].0, "broken.json");
        assert_eq!(lines[0].1, Severity::Error);
        assert_eq!(lines[1].0, "ok.json");
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let (validator, sink) = batch(ValidateConfig::new(dir.path()));

        let result = validator.run(std::iter::empty());

        assert!(result.success);
        assert_eq!(result.stats, BatchStats::default());
        assert!(sink.lines().is_empty());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_bad_mapping_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ValidateConfig::new(dir.path()).mapping("http://example.com/#frag", dir.path());

        assert!(matches!(BatchValidator::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_relative_mapping_uri_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ValidateConfig::new(dir.path()).mapping("schemas/", dir.path());

        assert!(matches!(BatchValidator::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_source_directory_is_fatal() {
        let (validator, _) = batch(ValidateConfig::new("/nonexistent/source/dir"));
        assert!(matches!(
            validator.validate_source_directory(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_stats_display() {
        let stats = BatchStats {
            documents: 3,
            succeeded: 2,
            failed: 1,
            errors: 4,
            warnings: 1,
        };
        assert_eq!(
            stats.to_string(),
            "Validated 3 document(s): 2 passed, 1 failed (4 error(s), 1 warning(s))"
        );
    }

    #[test]
    fn test_shared_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let (validator, sink) = batch(ValidateConfig::new(dir.path()));
        let validator = Arc::new(validator);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let validator = Arc::clone(&validator);
                std::thread::spawn(move || {
                    validator.run([Ok(SourceDocument::new(format!("{i}.json"), json!({})))])
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().success);
        }
        assert_eq!(sink.lines().len(), 4);
    }
}
