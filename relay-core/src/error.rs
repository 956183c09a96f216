//! Error types for relay-core.

use thiserror::Error;

/// Fatal configuration errors. Every variant aborts process startup; none of
/// them can occur once jobs are running.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No job list at all: neither `REPOS` nor a legacy `FROM_REPO`/`TO_REPO`
    /// pair was supplied.
    #[error("REPOS environment variable must be set")]
    NoJobs,

    /// The `REPOS` JSON job list failed to parse.
    #[error("could not parse REPOS: {0}")]
    InvalidJobList(#[from] serde_json::Error),

    /// A job entry has an empty `ID`.
    #[error("missing ID for job with from={from:?}")]
    MissingJobId { from: String },

    /// Two job entries share the same `ID`.
    #[error("duplicate job ID {id:?}")]
    DuplicateJobId { id: String },

    /// A job entry has an empty `From` or `To` endpoint.
    #[error("empty from or to for job {id:?}")]
    EmptyEndpoint { id: String },

    /// A numeric setting could not be parsed.
    #[error("invalid value {value:?} for {name}: {message}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        message: String,
    },

    /// A `metadata:`-prefixed value could not be resolved.
    #[error("could not resolve metadata value {key:?}: {message}")]
    SecretResolution { key: String, message: String },
}
