//! Logical-to-physical URI translation
//!
//! A translator is configured once through [`UriTranslatorBuilder`] and then
//! frozen. Resolution is pure: it never touches the network or the disk.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::uri;
use crate::{Error, Result};

/// A local directory serving the schemas published under `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriMapping {
    pub directory: PathBuf,
    pub uri: String,
}

impl UriMapping {
    pub fn new(uri: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            uri: uri.into(),
        }
    }
}

impl fmt::Display for UriMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {} -> {} }}", self.directory.display(), self.uri)
    }
}

/// Builder for a [`UriTranslator`]
#[derive(Debug, Clone, Default)]
pub struct UriTranslatorBuilder {
    namespace: Option<Url>,
    redirects: BTreeMap<String, Url>,
}

impl UriTranslatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URI that relative references resolve against.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the namespace carries a fragment or is not
    /// hierarchical.
    pub fn namespace(mut self, namespace: Url) -> Result<Self> {
        if namespace.cannot_be_a_base() {
            return Err(Error::config(format!(
                "Namespace {namespace} must be a hierarchical URI"
            )));
        }
        if namespace.fragment().is_some() {
            return Err(Error::config(format!(
                "Namespace {namespace} must not contain a fragment"
            )));
        }
        self.namespace = Some(namespace);
        Ok(self)
    }

    /// Use a local directory as the namespace root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the directory cannot be expressed as a
    /// `file:` URL.
    pub fn namespace_directory(self, directory: &Path) -> Result<Self> {
        let namespace = directory_url(directory)?;
        self.namespace(namespace)
    }

    /// Register a path redirect from the `from` prefix to the `to` prefix.
    ///
    /// `from` must be absolute and must not carry a fragment. A path without a
    /// trailing `/` is completed with one (and a warning is logged) so that
    /// equivalent spellings collapse to a single redirect. Registering the
    /// same prefix twice keeps the last target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `from` is malformed, relative, opaque, or
    /// has a fragment.
    pub fn redirect(mut self, from: &str, to: Url) -> Result<Self> {
        let from_url = normalize_prefix(from)?;
        let to_url = with_trailing_slash(to);

        debug!("Redirecting {} to {}", from_url, to_url);
        self.redirects.insert(from_url.into(), to_url);
        Ok(self)
    }

    /// Register a [`UriMapping`] as a redirect to its directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid mapping URI or a directory that
    /// cannot be turned into a `file:` URL.
    pub fn mapping(self, mapping: &UriMapping) -> Result<Self> {
        let target = directory_url(&mapping.directory)?;
        debug!("Mapping {} to {}", mapping.directory.display(), mapping.uri);
        self.redirect(&mapping.uri, target)
    }

    /// Register every mapping in order.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid mapping.
    pub fn mappings<'a>(self, mappings: impl IntoIterator<Item = &'a UriMapping>) -> Result<Self> {
        mappings
            .into_iter()
            .try_fold(self, |builder, mapping| builder.mapping(mapping))
    }

    /// Freeze the configuration into an immutable translator
    pub fn freeze(self) -> UriTranslator {
        UriTranslator {
            namespace: self.namespace,
            redirects: self.redirects,
        }
    }
}

/// Frozen URI translation table: a namespace root plus path redirects.
#[derive(Debug, Clone, Default)]
pub struct UriTranslator {
    namespace: Option<Url>,
    redirects: BTreeMap<String, Url>,
}

impl UriTranslator {
    pub fn builder() -> UriTranslatorBuilder {
        UriTranslatorBuilder::new()
    }

    pub fn namespace(&self) -> Option<&Url> {
        self.namespace.as_ref()
    }

    /// Registered redirects as `(prefix, target)` pairs, ordered by prefix
    pub fn redirects(&self) -> impl Iterator<Item = (&str, &Url)> {
        self.redirects.iter().map(|(from, to)| (from.as_str(), to))
    }

    /// Target registered for exactly this (normalized) prefix
    pub fn redirect_for(&self, prefix: &str) -> Option<&Url> {
        self.redirects.get(prefix)
    }

    /// Parse a reference and resolve it against the namespace root, without
    /// applying redirects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UriSyntax`] for malformed references.
    pub fn resolve_reference(&self, reference: &str) -> Result<Url> {
        uri::parse_reference(reference, self.namespace.as_ref())
    }

    /// Rewrite a logical URI through the longest matching redirect prefix.
    /// URIs no redirect matches are returned unchanged.
    pub fn translate(&self, logical: &Url) -> Url {
        let text = logical.as_str();
        let Some((prefix, target)) = self
            .redirects
            .iter()
            .filter(|(prefix, _)| text.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
        else {
            return logical.clone();
        };

        // Targets always end in '/', so plain concatenation keeps the
        // remainder relative to the target even when it contains ':'.
        let remainder = &text[prefix.len()..];
        match Url::parse(&format!("{target}{remainder}")) {
            Ok(physical) => physical,
            Err(e) => {
                warn!("Cannot apply redirect {} to {}: {}", prefix, logical, e);
                logical.clone()
            }
        }
    }

    /// Resolve a reference to the physical location its schema is read from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UriSyntax`] for malformed references.
    pub fn resolve(&self, reference: &str) -> Result<Url> {
        let logical = self.resolve_reference(reference)?;
        Ok(self.translate(&logical))
    }
}

fn normalize_prefix(input: &str) -> Result<Url> {
    let mut url = uri::parse_absolute(input)
        .map_err(|e| Error::config(format!("Invalid redirect URI {input}: {e}")))?;

    if url.fragment().is_some() {
        return Err(Error::config(format!(
            "URI {input} must not contain a fragment"
        )));
    }
    if url.cannot_be_a_base() {
        return Err(Error::config(format!(
            "URI {input} must be a hierarchical URI"
        )));
    }
    if url.query().is_some() {
        warn!("URI {} has a query, which is ignored for redirects", input);
        url.set_query(None);
    }
    if !url.path().ends_with('/') {
        warn!("URI {} does not end with '/'", input);
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.cannot_be_a_base() && !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn directory_url(directory: &Path) -> Result<Url> {
    let absolute = std::path::absolute(directory).map_err(|e| {
        Error::config(format!(
            "Cannot resolve directory {}: {e}",
            directory.display()
        ))
    })?;
    Url::from_directory_path(&absolute).map_err(|()| {
        Error::config(format!(
            "Directory {} cannot be expressed as a file URL",
            absolute.display()
        ))
    })
}
