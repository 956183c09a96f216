//! # relay-status
//!
//! Per-job status tracking, endpoint-safe redaction, and the aggregated
//! plain-text health report.
//!
//! The engine is the single writer through [`StatusTracker`]; the status
//! endpoint reads through [`StatusBoard::snapshot_all`] and renders with
//! [`render_report`].

pub mod record;
pub mod redact;
pub mod report;
pub mod tracker;

pub use record::{Outcome, Stage, StatusEvent, StatusRecord};
pub use redact::{Redactor, FROM_PLACEHOLDER, TO_PLACEHOLDER};
pub use report::{is_stale, render_report, JobStatusView, StatusReport, STALENESS_THRESHOLD};
pub use tracker::{StatusBoard, StatusTracker};
