//! Run configuration for a batch validation
//!
//! A [`ValidateConfig`] can be built in code or loaded from a YAML or JSON
//! file. Keys are `snake_case`; the camelCase spellings (`sourceDirectory`,
//! `schemaMappings`, ...) are accepted as aliases.
//!
//! ```yaml
//! source_directory: documents
//! includes: ["**/*.json"]
//! excludes: ["drafts/"]
//! schema_mappings:
//!   - uri: http://schemas.example.com/
//!     directory: schemas
//! require_schema: true
//! ```

use std::path::{Path, PathBuf};

use jsv_schema::{LoaderOptions, UriMapping};
use jsv_validation::ValidationConfig;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for validating a source directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateConfig {
    /// Root directory whose files are candidate documents
    #[serde(alias = "sourceDirectory")]
    pub source_directory: PathBuf,
    /// Patterns selecting candidate files, relative to the source directory
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    /// Patterns removing files the includes selected
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Local directories serving remote schema namespaces
    #[serde(default, alias = "schemaMappings")]
    pub schema_mappings: Vec<UriMapping>,
    #[serde(default = "default_true", alias = "deepCheck")]
    pub deep_check: bool,
    #[serde(default, alias = "requireSchema")]
    pub require_schema: bool,
    /// Validate each schema against its meta-schema before use
    #[serde(default = "default_true", alias = "checkSchemaSyntax")]
    pub check_schema_syntax: bool,
}

fn default_includes() -> Vec<String> {
    vec!["*.json".to_string()]
}

fn default_true() -> bool {
    true
}

impl ValidateConfig {
    /// Create a configuration with defaults for everything but the source
    /// directory
    pub fn new(source_directory: impl Into<PathBuf>) -> Self {
        Self {
            source_directory: source_directory.into(),
            includes: default_includes(),
            excludes: Vec::new(),
            schema_mappings: Vec::new(),
            deep_check: true,
            require_schema: false,
            check_schema_syntax: true,
        }
    }

    /// Replace the include patterns
    #[must_use]
    pub fn includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Serve schemas published under `uri` from `directory`
    #[must_use]
    pub fn mapping(mut self, uri: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        self.schema_mappings.push(UriMapping::new(uri, directory));
        self
    }

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

    #[must_use]
    pub fn check_schema_syntax(mut self, check_schema_syntax: bool) -> Self {
        self.check_schema_syntax = check_schema_syntax;
        self
    }

    /// Parse a configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the text is not a valid configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("YAML parse error: {e}")))
    }

    /// Parse a configuration from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("JSON parse error: {e}")))
    }

    /// Load a configuration file. `.json` files are read as JSON, anything
    /// else as YAML. Relative paths inside the file are resolved against the
    /// file's own directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if its contents are invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io("read config", path.display().to_string(), e.to_string()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.rebase(base))
    }

    /// Resolve relative directories against `base`
    #[must_use]
    pub fn rebase(mut self, base: &Path) -> Self {
        self.source_directory = rebase_path(base, &self.source_directory);
        for mapping in &mut self.schema_mappings {
            mapping.directory = rebase_path(base, &mapping.directory);
        }
        self
    }

    /// Settings for the per-document validator
    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig::default()
            .deep_check(self.deep_check)
            .require_schema(self.require_schema)
    }

    /// Settings for the schema loader
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            check_syntax: self.check_schema_syntax,
        }
    }
}

fn rebase_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
