use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity attached to a [`ProcessingMessage`](crate::ProcessingMessage).
///
/// Variants are ordered from least to most severe, so `max()` over a report
/// yields its worst message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recorded but never surfaced
    None,
    Debug,
    #[default]
    Info,
    Warning,
    /// Fails the enclosing report
    Error,
    /// Fails the enclosing report
    Fatal,
}

impl Severity {
    /// All severities, least severe first.
    pub const ALL: [Severity; 6] = [
        Severity::None,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Whether a message at this severity makes a report unsuccessful.
    pub fn is_failure(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }

    /// Lowercase name used in logs and serialized reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
