use serde::{Deserialize, Serialize};

use crate::{ProcessingMessage, Severity};

/// Ordered sequence of messages for one validated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    messages: Vec<ProcessingMessage>,
}

impl ProcessingReport {
    /// Create an empty, successful report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&mut self, message: ProcessingMessage) {
        self.messages.push(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(ProcessingMessage::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ProcessingMessage::error(message));
    }

    /// Fold another report into this one, keeping the other report's order
    /// after this report's existing messages.
    pub fn merge_with(&mut self, other: ProcessingReport) {
        self.messages.extend(other.messages);
    }

    /// True iff no message is an error or fatal
    pub fn is_success(&self) -> bool {
        !self.messages.iter().any(ProcessingMessage::is_failure)
    }

    pub fn messages(&self) -> &[ProcessingMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessingMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages at exactly `severity`
    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }
}

impl IntoIterator for ProcessingReport {
    type Item = ProcessingMessage;
    type IntoIter = std::vec::IntoIter<ProcessingMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a ProcessingReport {
    type Item = &'a ProcessingMessage;
    type IntoIter = std::slice::Iter<'a, ProcessingMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl FromIterator<ProcessingMessage> for ProcessingReport {
    fn from_iter<T: IntoIterator<Item = ProcessingMessage>>(iter: T) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl Extend<ProcessingMessage> for ProcessingReport {
    fn extend<T: IntoIterator<Item = ProcessingMessage>>(&mut self, iter: T) {
        self.messages.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_success() {
        let report = ProcessingReport::new();
        assert!(report.is_success());
        assert!(report.is_empty());
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut report = ProcessingReport::new();
        report.push(ProcessingMessage::new(Severity::Debug, "d"));
        report.push(ProcessingMessage::new(Severity::Info, "i"));
        report.warn("w");
        assert!(report.is_success());
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[test]
    fn test_error_or_fatal_fails() {
        let mut report = ProcessingReport::new();
        report.error("e");
        assert!(!report.is_success());

        let mut report = ProcessingReport::new();
        report.push(ProcessingMessage::new(Severity::Fatal, "f"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut outer = ProcessingReport::new();
        outer.warn("first");

        let mut inner = ProcessingReport::new();
        inner.error("second");
        inner.push(ProcessingMessage::new(Severity::Info, "third"));

        outer.merge_with(inner);

        let texts: Vec<&str> = outer.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert!(!outer.is_success());
        assert_eq!(outer.count(Severity::Error), 1);
    }

    #[test]
    fn test_collect_from_messages() {
        let report: ProcessingReport = vec![
            ProcessingMessage::new(Severity::Info, "a"),
            ProcessingMessage::warning("b"),
        ]
        .into_iter()
        .collect();
        assert_eq!(report.len(), 2);
        assert_eq!(report.messages()[1].message, "b");
    }
}
