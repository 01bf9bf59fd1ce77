//! Schema fetch capability

use url::Url;

use crate::{Error, Result};

/// Reads schema text from a physical location.
///
/// Implementations must be shareable across threads: one fetcher serves
/// every load a [`SchemaLoader`](crate::SchemaLoader) performs, including
/// `$ref` retrievals made while compiling.
pub trait SchemaFetcher: Send + Sync {
    /// Fetch the raw schema text at `location`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] when the location is unreachable or unreadable.
    fn fetch(&self, location: &Url) -> Result<String>;
}

/// Fetcher for `file:` URLs.
///
/// Any other scheme is reported as a load error; network retrieval is left to
/// other [`SchemaFetcher`] implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl SchemaFetcher for FileFetcher {
    fn fetch(&self, location: &Url) -> Result<String> {
        if location.scheme() != "file" {
            return Err(Error::load(
                location.as_str(),
                location.as_str(),
                format!("unsupported URI scheme '{}'", location.scheme()),
            ));
        }

        let path = location.to_file_path().map_err(|()| {
            Error::load(location.as_str(), location.as_str(), "not a local file path")
        })?;
        std::fs::read_to_string(&path)
            .map_err(|e| Error::load(location.as_str(), path.display().to_string(), e.to_string()))
    }
}
