//! Aggregated plain-text health report and staleness evaluation.

use std::time::Duration;

use chrono::{DateTime, Utc};

use relay_core::JobId;

use crate::record::StatusRecord;

/// Maximum age of a job's last success before it is reported unhealthy, even
/// if no individual operation is currently failing.
pub const STALENESS_THRESHOLD: Duration = Duration::from_secs(15 * 60);

/// One job's snapshot, paired with its id for rendering.
#[derive(Debug, Clone)]
pub struct JobStatusView {
    pub id: JobId,
    pub record: StatusRecord,
}

/// Rendered multi-job report plus the overall health verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub healthy: bool,
    pub body: String,
}

/// A job is stale when its last success is older than `threshold`, or when
/// it has never succeeded at all.
pub fn is_stale(record: &StatusRecord, threshold: Duration, now: DateTime<Utc>) -> bool {
    match record.last_ok_at {
        Some(at) => now.signed_duration_since(at).num_seconds() > threshold.as_secs() as i64,
        None => true,
    }
}

/// Render the aggregated report in configuration order.
///
/// Stale jobs are flagged before the per-job blocks; the report is unhealthy
/// if any job is stale or currently failing.
pub fn render_report(
    views: &[JobStatusView],
    threshold: Duration,
    now: DateTime<Utc>,
) -> StatusReport {
    let mut healthy = true;
    let mut body = String::new();

    for view in views {
        if is_stale(&view.record, threshold, now) {
            healthy = false;
            body.push_str(&format!("Repo {:?} possibly not fresh\n", view.id.0));
        }
        if !view.record.ok {
            healthy = false;
        }
    }

    for view in views {
        body.push_str(&format!("---- repo {} ----\n", view.id));
        body.push_str(&format!("OK now?    {}\n", view.record.ok));
        body.push_str(&format!("Last OK:   {}\n", format_time(view.record.last_ok_at)));
        body.push_str(&format!(
            "Last try:  {}\n",
            format_time(view.record.last_attempt_at)
        ));
        body.push_str(&view.record.message);
        body.push('\n');
    }

    StatusReport { healthy, body }
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        None => "never".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
