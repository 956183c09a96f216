//! Domain types for relay mirror jobs.
//!
//! A [`JobSpec`] is constructed once at startup from configuration and never
//! mutated afterward. All path fields use `PathBuf`; never `&str` or `String`
//! for filesystem paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identifier for a mirror job.
///
/// Used for directory naming, log prefixing, and status grouping. Uniqueness
/// across the configured job list is validated at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One configured source→destination repository mirroring task.
///
/// Field names on the wire follow the legacy JSON job list: `ID`, `From`,
/// `To`, `HTTPCookie`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(rename = "ID")]
    pub id: JobId,

    /// Source repository location. May carry embedded credentials; never log
    /// without redaction.
    #[serde(rename = "From")]
    pub from: String,

    /// Destination repository location. Same redaction caveat as `from`.
    #[serde(rename = "To")]
    pub to: String,

    /// Opaque credential blob materialized into the cookie file during
    /// bootstrap, consumed by the transport via `http.cookiefile`.
    #[serde(rename = "HTTPCookie", default, skip_serializing_if = "Option::is_none")]
    pub http_cookie: Option<String>,
}

impl JobSpec {
    /// The job's working directory, exclusively owned by its engine.
    pub fn repo_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("repo-{}", self.id))
    }

    /// The job's credential file path, next to the working directory.
    pub fn cookie_file(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("cookies-{}", self.id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_display() {
        assert_eq!(JobId::from("upstream").to_string(), "upstream");
    }

    #[test]
    fn job_id_equality() {
        let a = JobId::from("x");
        let b = JobId::from(String::from("x"));
        assert_eq!(a, b);
    }

    #[test]
    fn derived_paths_embed_the_job_id() {
        let job = JobSpec {
            id: JobId::from("a"),
            from: "u1".to_string(),
            to: "u2".to_string(),
            http_cookie: None,
        };
        let base = Path::new("/var/lib/relay");
        assert_eq!(job.repo_dir(base), PathBuf::from("/var/lib/relay/repo-a"));
        assert_eq!(
            job.cookie_file(base),
            PathBuf::from("/var/lib/relay/cookies-a")
        );
    }

    #[test]
    fn job_spec_wire_field_names() {
        let json = r#"{"ID":"a","From":"u1","To":"u2","HTTPCookie":"c=1"}"#;
        let job: JobSpec = serde_json::from_str(json).expect("deserialize");
        assert_eq!(job.id, JobId::from("a"));
        assert_eq!(job.from, "u1");
        assert_eq!(job.to, "u2");
        assert_eq!(job.http_cookie.as_deref(), Some("c=1"));
    }

    #[test]
    fn http_cookie_defaults_to_none() {
        let json = r#"{"ID":"a","From":"u1","To":"u2"}"#;
        let job: JobSpec = serde_json::from_str(json).expect("deserialize");
        assert!(job.http_cookie.is_none());
    }
}
