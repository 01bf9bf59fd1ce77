//! Candidate file discovery under the source directory
//!
//! Patterns follow the Ant conventions used by build tools:
//!
//! - `*` matches any run of characters within one path segment
//! - `?` matches exactly one character within a segment
//! - `**` matches zero or more whole segments
//! - a trailing `/` is shorthand for `/**`
//!
//! Patterns are matched against `/`-separated paths relative to the source
//! directory, so `*.json` only selects top-level files while `**/*.json`
//! selects every JSON file in the tree.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::{Error, Result};

/// A compiled include or exclude pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
}

impl PathPattern {
    /// Compile an Ant-style pattern
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let normalized = pattern.replace('\\', "/");
        let mut normalized = normalized.trim_start_matches('/').to_string();
        if normalized.is_empty() {
            return Err(Error::config(format!("Empty file pattern '{pattern}'")));
        }
        if normalized.ends_with('/') {
            normalized.push_str("**");
        }

        let regex = Regex::new(&to_regex(&normalized))
            .map_err(|e| Error::config(format!("Invalid file pattern '{pattern}': {e}")))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Whether a `/`-separated relative path matches
    pub fn matches(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn to_regex(pattern: &str) -> String {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut out = String::from("^");

    for (index, segment) in segments.iter().enumerate() {
        let last = index + 1 == segments.len();
        if *segment == "**" {
            out.push_str(if last { ".*" } else { "(?:[^/]*/)*" });
            continue;
        }
        for c in segment.chars() {
            match c {
                '*' => out.push_str("[^/]*"),
                '?' => out.push_str("[^/]"),
                other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        if !last {
            out.push('/');
        }
    }

    out.push('$');
    out
}

/// A file selected for validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// `/`-separated path relative to the source directory
    pub id: String,
    pub path: PathBuf,
}

/// Walks the source directory and yields files matching the patterns
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    base: PathBuf,
    includes: Vec<PathPattern>,
    excludes: Vec<PathPattern>,
}

impl FileDiscovery {
    /// Prepare discovery under `base`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base` is not a directory or a pattern is
    /// invalid.
    pub fn new(base: impl Into<PathBuf>, includes: &[String], excludes: &[String]) -> Result<Self> {
        let base = base.into();
        if !base.is_dir() {
            return Err(Error::config(format!(
                "Source directory {} does not exist or is not a directory",
                base.display()
            )));
        }

        let includes = compile(includes)?;
        let excludes = compile(excludes)?;
        debug!(
            "Discovering files in {} (includes: {:?}, excludes: {:?})",
            base.display(),
            includes.iter().map(PathPattern::as_str).collect::<Vec<_>>(),
            excludes.iter().map(PathPattern::as_str).collect::<Vec<_>>()
        );

        Ok(Self {
            base,
            includes,
            excludes,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether a relative path is selected by the includes and not removed by
    /// the excludes
    pub fn is_selected(&self, relative: &str) -> bool {
        self.includes.iter().any(|p| p.matches(relative))
            && !self.excludes.iter().any(|p| p.matches(relative))
    }

    /// Lazily walk the tree in file-name order.
    ///
    /// A walk error is yielded as [`Error::Io`] only when it concerns the
    /// source directory itself or a path the patterns select. Symlink loops
    /// and unreadable entries outside the selection are logged and skipped.
    pub fn files(&self) -> impl Iterator<Item = Result<DiscoveredFile>> + '_ {
        WalkDir::new(&self.base)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let id = relative_id(&self.base, entry.path())?;
                    if self.is_selected(&id) {
                        Some(Ok(DiscoveredFile {
                            id,
                            path: entry.into_path(),
                        }))
                    } else {
                        trace!("Skipping {}", id);
                        None
                    }
                }
                Ok(_) => None,
                Err(e) => {
                    let id = e.path().and_then(|p| relative_id(&self.base, p));
                    match id {
                        Some(id) if id.is_empty() => Some(Err(Error::io(
                            "discover",
                            self.base.display().to_string(),
                            e.to_string(),
                        ))),
                        Some(id) if e.loop_ancestor().is_none() && self.is_selected(&id) => {
                            Some(Err(Error::io("discover", id, e.to_string())))
                        }
                        _ => {
                            warn!("Skipping unreadable entry: {}", e);
                            None
                        }
                    }
                }
            })
    }
}

fn compile(patterns: &[String]) -> Result<Vec<PathPattern>> {
    patterns.iter().map(|p| PathPattern::new(p)).collect()
}

fn relative_id(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pattern(p: &str) -> PathPattern {
        PathPattern::new(p).unwrap()
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let p = pattern("*.json");
        assert!(p.matches("a.json"));
        assert!(!p.matches("sub/a.json"));
        assert!(!p.matches("a.json.bak"));
    }

    #[test]
    fn test_double_star_spans_segments() {
        let p = pattern("**/*.json");
        assert!(p.matches("a.json"));
        assert!(p.matches("x/y/a.json"));
        assert!(!p.matches("x/y/a.yaml"));

        let p = pattern("orders/**/*.json");
        assert!(p.matches("orders/a.json"));
        assert!(p.matches("orders/2024/q1/a.json"));
        assert!(!p.matches("invoices/a.json"));
    }

    #[test]
    fn test_question_mark_and_literals() {
        let p = pattern("v?/data+1.json");
        assert!(p.matches("v1/data+1.json"));
        assert!(!p.matches("v10/data+1.json"));
        assert!(!p.matches("v1/dataa1.json"));
    }

    #[test]
    fn test_trailing_slash_means_whole_directory() {
        let p = pattern("drafts/");
        assert!(p.matches("drafts/a.json"));
        assert!(p.matches("drafts/deep/b.json"));
        assert!(!p.matches("drafts.json"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(PathPattern::new(""), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let err = FileDiscovery::new("/nonexistent/source", &["*.json".into()], &[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested/drafts")).unwrap();
        for name in [
            "b.json",
            "a.json",
            "notes.txt",
            "nested/c.json",
            "nested/drafts/d.json",
        ] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let discovery = FileDiscovery::new(
            dir.path(),
            &["**/*.json".into()],
            &["**/drafts/".into()],
        )
        .unwrap();
        let ids: Vec<String> = discovery.files().map(|f| f.unwrap().id).collect();

        assert_eq!(ids, vec!["a.json", "b.json", "nested/c.json"]);
    }

    #[test]
    fn test_default_include_is_top_level_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("top.json"), "{}").unwrap();
        fs::write(dir.path().join("sub/inner.json"), "{}").unwrap();

        let discovery = FileDiscovery::new(dir.path(), &["*.json".into()], &[]).unwrap();
        let files: Vec<DiscoveredFile> = discovery.files().map(Result::unwrap).collect();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "top.json");
        assert_eq!(files[0].path, dir.path().join("top.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_outside_selection_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let discovery = FileDiscovery::new(dir.path(), &["*.json".into()], &[]).unwrap();
        let results: Vec<Result<DiscoveredFile>> = discovery.files().collect();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().id, "a.json");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped_under_recursive_include() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("sub/b.json"), "{}").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let discovery = FileDiscovery::new(dir.path(), &["**".into()], &[]).unwrap();
        let ids: Vec<String> = discovery.files().map(|f| f.unwrap().id).collect();

        assert_eq!(ids, vec!["a.json", "sub/b.json"]);
    }
}
