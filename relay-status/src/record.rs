//! Per-job status record and the structured events that update it.

use std::fmt;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Lifecycle stage a status event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clone,
    Credentials,
    AddRemote,
    Pull,
    ReadHead,
    ListTags,
    PushBranches,
    PushTags,
    Synced,
}

impl Stage {
    /// Human-readable label used in status messages and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Clone => "clone",
            Stage::Credentials => "credentials",
            Stage::AddRemote => "add remote",
            Stage::Pull => "pull",
            Stage::ReadHead => "read head",
            Stage::ListTags => "list tags",
            Stage::PushBranches => "push branches",
            Stage::PushTags => "push tags",
            Stage::Synced => "synced",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Outcome of a stage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

/// A structured status update: outcome, stage, and the optional external
/// process output and error text. Rendering and redaction operate on these
/// typed fields; free-text concatenation happens in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub outcome: Outcome,
    pub stage: Stage,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl StatusEvent {
    pub fn ok(stage: Stage) -> Self {
        Self {
            outcome: Outcome::Ok,
            stage,
            output: None,
            error: None,
        }
    }

    pub fn failed(stage: Stage, error: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            stage,
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        let output = output.into();
        if !output.is_empty() {
            self.output = Some(output);
        }
        self
    }

    /// Compose the public message for this event. The result still contains
    /// whatever the external tool printed; redaction happens before storage.
    pub fn compose_message(&self) -> String {
        let mut message = self.stage.label().to_string();
        if let Some(error) = &self.error {
            message.push_str(": ");
            message.push_str(error);
        }
        if let Some(output) = &self.output {
            message.push('\n');
            message.push_str(output.trim_end());
        }
        message
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The shared per-job status record read by the health endpoint.
///
/// One writer (the job's engine), many readers; the tracker guards it with a
/// per-job lock so neither side observes a torn record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    /// Normal state? False after any recorded failure until the next success.
    pub ok: bool,
    /// Stage of the most recent status update.
    pub stage: Stage,
    /// Latest redacted, public-safe message.
    pub message: String,
    /// When any status was last recorded.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// When a healthy status was last recorded.
    pub last_ok_at: Option<DateTime<Utc>>,
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            ok: true,
            stage: Stage::Clone,
            message: String::new(),
            last_attempt_at: None,
            last_ok_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
