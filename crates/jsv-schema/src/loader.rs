//! Schema loader with a compile-once cache
//!
//! Each logical schema URI owns one cache cell. The first caller for a URI
//! fetches, checks and compiles the schema inside the cell; concurrent callers
//! for the same URI block on that cell and receive the same result. Failures
//! are cached too, so a broken schema fails identically for every document
//! that references it.
//!
//! The JSON Schema meta-schemas ship with the validation engine. Requests for
//! them are served from those bundled copies unless a mapping redirects them.

use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use jsonschema::{Draft, Retrieve, Uri, Validator};
use serde_json::{Value, json};
use tracing::{debug, info, trace};
use url::Url;

use crate::fetch::{FileFetcher, SchemaFetcher};
use crate::translator::UriTranslator;
use crate::{Error, Result};

/// Meta-schemas bundled with the engine, keyed without scheme, with the
/// identifier the engine registers them under
const BUNDLED_META_SCHEMAS: &[(&str, &str, Draft)] = &[
    (
        "json-schema.org/draft-04/schema",
        "http://json-schema.org/draft-04/schema#",
        Draft::Draft4,
    ),
    (
        "json-schema.org/draft-06/schema",
        "http://json-schema.org/draft-06/schema#",
        Draft::Draft6,
    ),
    (
        "json-schema.org/draft-07/schema",
        "http://json-schema.org/draft-07/schema#",
        Draft::Draft7,
    ),
    (
        "json-schema.org/draft/2019-09/schema",
        "https://json-schema.org/draft/2019-09/schema",
        Draft::Draft201909,
    ),
    (
        "json-schema.org/draft/2020-12/schema",
        "https://json-schema.org/draft/2020-12/schema",
        Draft::Draft202012,
    ),
];

type CacheCell = Arc<OnceLock<Result<Arc<CompiledSchema>>>>;

/// Options controlling how schemas are loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Validate each schema against its meta-schema before compiling it
    pub check_syntax: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self { check_syntax: true }
    }
}

/// A schema ready to validate documents
pub struct CompiledSchema {
    uri: Url,
    location: Url,
    validator: Validator,
}

impl CompiledSchema {
    /// Logical URI the schema was requested under
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Physical location the schema was read from
    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("uri", &self.uri.as_str())
            .field("location", &self.location.as_str())
            .finish_non_exhaustive()
    }
}

/// Loads schemas through a [`UriTranslator`] and a [`SchemaFetcher`],
/// compiling each logical URI at most once.
pub struct SchemaLoader {
    translator: Arc<UriTranslator>,
    fetcher: Arc<dyn SchemaFetcher>,
    options: LoaderOptions,
    cache: DashMap<String, CacheCell>,
}

impl SchemaLoader {
    /// Create a loader reading local files
    pub fn new(translator: UriTranslator) -> Self {
        Self::with_fetcher(translator, Arc::new(FileFetcher))
    }

    /// Create a loader with a custom fetch capability
    pub fn with_fetcher(translator: UriTranslator, fetcher: Arc<dyn SchemaFetcher>) -> Self {
        Self {
            translator: Arc::new(translator),
            fetcher,
            options: LoaderOptions::default(),
            cache: DashMap::new(),
        }
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn translator(&self) -> &UriTranslator {
        &self.translator
    }

    pub fn options(&self) -> LoaderOptions {
        self.options
    }

    /// Resolve a reference against the namespace and load it.
    ///
    /// # Errors
    ///
    /// See [`SchemaLoader::load`]; additionally returns [`Error::UriSyntax`]
    /// for a malformed reference.
    pub fn load_reference(&self, reference: &str) -> Result<Arc<CompiledSchema>> {
        let uri = self.translator.resolve_reference(reference)?;
        self.load(&uri)
    }

    /// Load the schema at a logical URI, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] when the source cannot be read, [`Error::Parse`]
    /// for malformed JSON, and [`Error::SchemaSyntax`] when the schema fails
    /// its meta-schema check or cannot be compiled. The same error is returned
    /// for every later request of the same URI.
    pub fn load(&self, uri: &Url) -> Result<Arc<CompiledSchema>> {
        let cell = Arc::clone(&*self.cache.entry(uri.to_string()).or_default());

        if cell.get().is_some() {
            debug!("Cache hit for schema: {}", uri);
        }

        cell.get_or_init(|| {
            trace!("Cache miss for schema: {}", uri);
            self.compile(uri)
        })
        .clone()
    }

    /// Whether a load for `uri` has completed (successfully or not)
    pub fn is_cached(&self, uri: &Url) -> bool {
        self.cache
            .get(uri.as_str())
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Number of URIs with a completed load
    pub fn cached_count(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    fn compile(&self, uri: &Url) -> Result<Arc<CompiledSchema>> {
        let location = self.translator.translate(uri);
        if let Some((canonical, draft)) =
            bundled_meta_schema(uri.as_str()).filter(|_| location == *uri)
        {
            return compile_bundled(uri, canonical, draft);
        }

        let mut fetch_location = location.clone();
        fetch_location.set_fragment(None);

        info!("Loading schema {} from {}", uri, fetch_location);
        let text = self
            .fetcher
            .fetch(&fetch_location)
            .map_err(|e| attribute_to(e, uri))?;

        let mut schema: Value = serde_json::from_str(&text).map_err(|e| Error::Parse {
            uri: uri.to_string(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;

        if self.options.check_syntax {
            check_syntax(uri, &schema)?;
        }
        anchor_base_uri(&mut schema, uri);

        let mut options = jsonschema::options();
        options.with_retriever(RedirectingRetriever {
            translator: Arc::clone(&self.translator),
            fetcher: Arc::clone(&self.fetcher),
        });
        let validator = options
            .build(&schema)
            .map_err(|e| Error::schema_syntax(uri.as_str(), e.to_string()))?;

        debug!("Compiled schema {}", uri);
        Ok(Arc::new(CompiledSchema {
            uri: uri.clone(),
            location,
            validator,
        }))
    }
}

impl fmt::Debug for SchemaLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaLoader")
            .field("translator", &self.translator)
            .field("options", &self.options)
            .field("cached", &self.cached_count())
            .finish_non_exhaustive()
    }
}

/// Resolves external `$ref`s met while compiling, through the same
/// translation table and fetcher as top-level schemas.
struct RedirectingRetriever {
    translator: Arc<UriTranslator>,
    fetcher: Arc<dyn SchemaFetcher>,
}

impl Retrieve for RedirectingRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let logical = Url::parse(uri.as_str())?;
        let mut location = self.translator.translate(&logical);
        location.set_fragment(None);

        debug!("Retrieving referenced schema {} from {}", logical, location);
        let text = self.fetcher.fetch(&location)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Report fetch failures against the logical URI the caller asked for
fn attribute_to(error: Error, uri: &Url) -> Error {
    match error {
        Error::Load {
            location, message, ..
        } => Error::load(uri.as_str(), location, message),
        other => other,
    }
}

/// Compile a wrapper referencing a meta-schema the engine already holds
fn compile_bundled(uri: &Url, canonical: &str, draft: Draft) -> Result<Arc<CompiledSchema>> {
    debug!("Using bundled meta-schema {} for {}", canonical, uri);
    let wrapper = json!({"$schema": canonical, "$ref": canonical});
    let validator = jsonschema::options()
        .with_draft(draft)
        .build(&wrapper)
        .map_err(|e| Error::schema_syntax(uri.as_str(), e.to_string()))?;

    Ok(Arc::new(CompiledSchema {
        uri: uri.clone(),
        location: uri.clone(),
        validator,
    }))
}

/// Bundled identifier and draft for a well-known meta-schema URI, accepting
/// either scheme and an optional empty fragment
fn bundled_meta_schema(declared: &str) -> Option<(&'static str, Draft)> {
    let trimmed = declared.trim_end_matches('#');
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    BUNDLED_META_SCHEMAS
        .iter()
        .find(|(key, _, _)| *key == without_scheme)
        .map(|(_, canonical, draft)| (*canonical, *draft))
}

fn is_known_meta_schema(declared: &str) -> bool {
    bundled_meta_schema(declared).is_some()
}

fn check_syntax(uri: &Url, schema: &Value) -> Result<()> {
    match schema.get("$schema") {
        Some(Value::String(declared)) if !is_known_meta_schema(declared) => {
            debug!(
                "Skipping syntax check of {}: unknown meta-schema {}",
                uri, declared
            );
            return Ok(());
        }
        Some(declared) if !declared.is_string() => {
            return Err(Error::schema_syntax(
                uri.as_str(),
                "$schema keyword must be a string",
            ));
        }
        _ => {}
    }

    if !schema.is_object() && !schema.is_boolean() {
        return Err(Error::schema_syntax(
            uri.as_str(),
            "schema must be an object or a boolean",
        ));
    }

    jsonschema::meta::validate(schema).map_err(|e| {
        let path = e.instance_path.to_string();
        let at = if path.is_empty() { "(root)" } else { path.as_str() };
        Error::schema_syntax(uri.as_str(), format!("{e} at {at}"))
    })
}

/// Give a schema without an identifier its logical URI as base, so relative
/// `$ref`s resolve (and get redirected) relative to where it was requested.
fn anchor_base_uri(schema: &mut Value, uri: &Url) {
    let Value::Object(map) = schema else {
        return;
    };

    let draft4 = map
        .get("$schema")
        .and_then(Value::as_str)
        .is_some_and(|s| s.contains("draft-04"));
    let key = if draft4 { "id" } else { "$id" };
    if map.contains_key(key) {
        return;
    }

    let mut base = uri.clone();
    base.set_fragment(None);
    map.insert(key.to_string(), Value::String(base.into()));
}
