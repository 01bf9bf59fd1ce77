//! Destination for per-document messages

use jsv_report::Severity;
use tracing::{debug, error, info, warn};

/// Receives every message produced while validating a batch, tagged with the
/// identifier of the document it belongs to.
pub trait LogSink: Send + Sync {
    fn log(&self, identifier: &str, severity: Severity, text: &str);
}

/// Forwards messages to `tracing` as `"<identifier>: <text>"`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, identifier: &str, severity: Severity, text: &str) {
        match severity {
            Severity::None => {}
            Severity::Debug => debug!("{}: {}", identifier, text),
            Severity::Info => info!("{}: {}", identifier, text),
            Severity::Warning => warn!("{}: {}", identifier, text),
            Severity::Error | Severity::Fatal => error!("{}: {}", identifier, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_severity_is_accepted() {
        for severity in Severity::ALL {
            TracingSink.log("a.json", severity, "message");
        }
    }

    #[test]
    fn test_sink_is_object_safe() {
        let sinks: Vec<Box<dyn LogSink>> = vec![Box::new(TracingSink)];
        sinks[0].log("a.json", Severity::Warning, "Missing $schema");
    }
}
