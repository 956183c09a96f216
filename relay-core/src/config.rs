//! Startup configuration: environment surface, job-list parsing, validation,
//! and `metadata:` secret indirection.
//!
//! Everything here runs exactly once at process startup. Any error is fatal;
//! a [`Settings`] value that made it out of [`Settings::from_vars`] is
//! immutable for the lifetime of the process.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{JobId, JobSpec};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Prefix marking a configuration value as indirect: the remainder is a key
/// to resolve through the configured [`SecretResolver`].
pub const METADATA_PREFIX: &str = "metadata:";

// ---------------------------------------------------------------------------
// Secret resolution
// ---------------------------------------------------------------------------

/// Resolves `metadata:<key>` configuration values to concrete strings.
///
/// The production implementation queries the host metadata service; tests
/// substitute a map-backed resolver. Resolution happens only at startup, so
/// the contract is deliberately synchronous.
pub trait SecretResolver {
    fn resolve(&self, key: &str) -> Result<String, ConfigError>;
}

/// Resolver for deployments that use no `metadata:` indirection. Any lookup
/// is an error, which keeps a stray prefix from silently passing through as
/// a literal URL.
#[derive(Debug, Default)]
pub struct NoIndirection;

impl SecretResolver for NoIndirection {
    fn resolve(&self, key: &str) -> Result<String, ConfigError> {
        Err(ConfigError::SecretResolution {
            key: key.to_string(),
            message: "no metadata resolver configured".to_string(),
        })
    }
}

/// Resolve `value` through `resolver` if it carries the `metadata:` prefix;
/// return it unchanged otherwise.
pub fn reconcile(value: &str, resolver: &dyn SecretResolver) -> Result<String, ConfigError> {
    match value.strip_prefix(METADATA_PREFIX) {
        Some(key) => resolver.resolve(key),
        None => Ok(value.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Immutable-after-construction daemon settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// HTTP status endpoint listen port (`PORT`, default 8080).
    pub port: u16,
    /// Minimum spacing between sync iterations per job
    /// (`SYNC_INTERVAL_SECS`, default 60).
    pub sync_interval: Duration,
    /// Base directory for per-job working directories and cookie files
    /// (`RELAY_DATA_DIR`). `None` leaves the choice to the caller.
    pub data_dir: Option<PathBuf>,
    /// Configured jobs, in configuration order. Non-empty, unique ids,
    /// endpoints already resolved through the secret resolver.
    pub jobs: Vec<JobSpec>,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env(resolver: &dyn SecretResolver) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars, resolver)
    }

    /// Load settings from an explicit variable map. This is the testable
    /// entrypoint; [`Settings::from_env`] is a thin wrapper.
    pub fn from_vars(
        vars: &HashMap<String, String>,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let jobs = load_jobs(vars, resolver)?;

        let port = match non_empty(vars, "PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|err| ConfigError::InvalidSetting {
                name: "PORT",
                value: raw.to_string(),
                message: err.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let sync_interval = match non_empty(vars, "SYNC_INTERVAL_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|err| ConfigError::InvalidSetting {
                    name: "SYNC_INTERVAL_SECS",
                    value: raw.to_string(),
                    message: err.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidSetting {
                        name: "SYNC_INTERVAL_SECS",
                        value: raw.to_string(),
                        message: "interval must be at least one second".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_SYNC_INTERVAL,
        };

        let data_dir = non_empty(vars, "RELAY_DATA_DIR").map(PathBuf::from);

        Ok(Self {
            port,
            sync_interval,
            data_dir,
            jobs,
        })
    }
}

// ---------------------------------------------------------------------------
// Job list loading
// ---------------------------------------------------------------------------

/// Parse and validate the job list.
///
/// `REPOS` (a JSON array, itself possibly `metadata:`-indirect) wins over the
/// legacy single `FROM_REPO`/`TO_REPO` pair. Per-job `From`/`To` values are
/// resolved after the non-empty checks, so a blank endpoint is reported as a
/// configuration error rather than a failed lookup.
fn load_jobs(
    vars: &HashMap<String, String>,
    resolver: &dyn SecretResolver,
) -> Result<Vec<JobSpec>, ConfigError> {
    let mut jobs: Vec<JobSpec> = match non_empty(vars, "REPOS") {
        Some(spec) => {
            let spec = reconcile(spec, resolver)?;
            serde_json::from_str(&spec)?
        }
        None => match (non_empty(vars, "FROM_REPO"), non_empty(vars, "TO_REPO")) {
            (Some(from), Some(to)) => vec![JobSpec {
                id: JobId::from("default"),
                from: from.to_string(),
                to: to.to_string(),
                http_cookie: None,
            }],
            _ => return Err(ConfigError::NoJobs),
        },
    };

    let mut seen = HashSet::new();
    for job in &mut jobs {
        if job.id.0.is_empty() {
            return Err(ConfigError::MissingJobId {
                from: job.from.clone(),
            });
        }
        if !seen.insert(job.id.0.clone()) {
            return Err(ConfigError::DuplicateJobId {
                id: job.id.0.clone(),
            });
        }
        if job.from.is_empty() || job.to.is_empty() {
            return Err(ConfigError::EmptyEndpoint {
                id: job.id.0.clone(),
            });
        }
        job.from = reconcile(&job.from, resolver)?;
        job.to = reconcile(&job.to, resolver)?;
    }

    Ok(jobs)
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
