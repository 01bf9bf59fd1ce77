#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # jsv-report
//!
//! Processing messages and reports produced while validating documents.
//!
//! A [`ProcessingReport`] is an ordered list of [`ProcessingMessage`]s. Its
//! success flag is derived: a report succeeds unless it holds at least one
//! message of [`Severity::Error`] or [`Severity::Fatal`]. Reports from nested
//! steps are folded into an outer report with [`ProcessingReport::merge_with`],
//! preserving insertion order.
//!
//! ```rust
//! use jsv_report::{ProcessingReport, Severity};
//!
//! let mut report = ProcessingReport::new();
//! report.warn("Missing $schema");
//! assert!(report.is_success());
//!
//! report.error("instance is not of type \"object\"");
//! assert!(!report.is_success());
//! assert_eq!(report.count(Severity::Warning), 1);
//! ```

/// Single diagnostic produced during validation.
pub mod message;
/// Ordered, mergeable collection of messages.
pub mod report;
/// Severity levels and their ordering.
pub mod severity;

pub use message::ProcessingMessage;
pub use report::ProcessingReport;
pub use severity::Severity;
