//! The per-job mirror state machine.
//!
//! Bootstrap runs once: clone, optional credential setup, destination remote
//! registration. The sync loop then runs until cancellation, one rate-limited
//! iteration at a time: pull, read head, list tags, detect changes, push.
//! Iteration failures are recorded and abandoned; the observed-value snapshot
//! only advances on a fully successful iteration, so a missed change is
//! always retried.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use relay_core::JobSpec;
use relay_detector::{detect, Snapshot};
use relay_status::{Stage, StatusTracker};

use crate::error::GitError;
use crate::git::{GitTool, PushScope, MIRROR_REMOTE};
use crate::limiter::RateLimiter;

/// Delay between clone attempts. Clone failures destroy the partial working
/// directory first, so every retry starts clean.
pub const CLONE_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Delay between destination-remote registration attempts.
pub const REMOTE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// One job's mirroring engine. Owns the job's working directory and sync
/// state exclusively; shares only the status tracker with the outside world.
pub struct MirrorEngine {
    job: JobSpec,
    data_dir: PathBuf,
    git: Arc<dyn GitTool>,
    tracker: StatusTracker,
    limiter: RateLimiter,
    state: Snapshot,
    cancel: CancellationToken,
}

impl MirrorEngine {
    pub fn new(
        job: JobSpec,
        data_dir: PathBuf,
        git: Arc<dyn GitTool>,
        tracker: StatusTracker,
        sync_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job,
            data_dir,
            git,
            tracker,
            limiter: RateLimiter::new(sync_interval),
            state: Snapshot::default(),
            cancel,
        }
    }

    /// Run the job until the cancellation token fires. Never returns early on
    /// errors: bootstrap failures retry forever, iteration failures are
    /// recorded and retried at the next token.
    pub async fn run(mut self) {
        tracing::info!(job = %self.job.id, "mirror job starting");
        if !self.clone_repo().await {
            return;
        }
        if !self.setup_credentials().await {
            return;
        }
        if !self.add_remote().await {
            return;
        }
        self.sync_loop().await;
    }

    // -----------------------------------------------------------------------
    // Bootstrap
    // -----------------------------------------------------------------------

    /// Clone `from` into the working directory, retrying every
    /// [`CLONE_RETRY_DELAY`] until it succeeds. Returns false on cancellation.
    async fn clone_repo(&mut self) -> bool {
        let dir = self.job.repo_dir(&self.data_dir);
        self.tracker.success(Stage::Clone, None).await;

        loop {
            let git = Arc::clone(&self.git);
            let attempt = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                result = git.clone_repo(&self.job.from, &dir) => result,
            };

            match attempt {
                Ok(output) => {
                    self.tracker.success(Stage::Clone, Some(output)).await;
                    return true;
                }
                Err(err) => {
                    self.record_git_failure(Stage::Clone, &err).await;
                    remove_partial_clone(&self.job, &dir).await;
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return false,
                        _ = sleep(CLONE_RETRY_DELAY) => {}
                    }
                }
            }
        }
    }

    /// Materialize the credential blob and point the transport at it.
    /// Best-effort: failures are recorded but the engine always proceeds.
    async fn setup_credentials(&mut self) -> bool {
        let Some(cookie) = self.job.http_cookie.clone() else {
            return true;
        };

        let cookie_file = self.job.cookie_file(&self.data_dir);
        if let Err(err) = write_restricted(&cookie_file, &cookie) {
            self.tracker
                .failure(Stage::Credentials, err.to_string(), None)
                .await;
            return true;
        }

        let dir = self.job.repo_dir(&self.data_dir);
        let git = Arc::clone(&self.git);
        let cookie_path = cookie_file.to_string_lossy();
        let attempt = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = git.set_config(&dir, "http.cookiefile", &cookie_path) => result,
        };
        match attempt {
            Ok(_) => self.tracker.success(Stage::Credentials, None).await,
            Err(err) => self.record_git_failure(Stage::Credentials, &err).await,
        }
        true
    }

    /// Register the destination remote, retrying every
    /// [`REMOTE_RETRY_DELAY`] until it succeeds. Returns false on
    /// cancellation.
    async fn add_remote(&mut self) -> bool {
        let dir = self.job.repo_dir(&self.data_dir);

        loop {
            self.tracker.success(Stage::AddRemote, None).await;
            let git = Arc::clone(&self.git);
            let attempt = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                result = git.add_remote(&dir, MIRROR_REMOTE, &self.job.to) => result,
            };

            match attempt {
                Ok(output) => {
                    self.tracker.success(Stage::AddRemote, Some(output)).await;
                    return true;
                }
                Err(err) => {
                    self.record_git_failure(Stage::AddRemote, &err).await;
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return false,
                        _ = sleep(REMOTE_RETRY_DELAY) => {}
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sync loop
    // -----------------------------------------------------------------------

    async fn sync_loop(&mut self) {
        let dir = self.job.repo_dir(&self.data_dir);
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = self.limiter.acquire() => {}
            }
            if !self.sync_once(&dir).await {
                return;
            }
        }
    }

    /// One pull-detect-push iteration. Returns false on cancellation; all
    /// other outcomes return true, with failures recorded and the snapshot
    /// left untouched.
    async fn sync_once(&mut self, dir: &Path) -> bool {
        let git = Arc::clone(&self.git);
        tracing::debug!(job = %self.job.id, "pulling");

        let pulled = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = git.pull(dir) => result,
        };
        if let Err(err) = pulled {
            self.record_git_failure(Stage::Pull, &err).await;
            return true;
        }

        let head = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = git.head_ref(dir) => result,
        };
        let head = match head {
            Ok(head) => head,
            Err(err) => {
                self.record_git_failure(Stage::ReadHead, &err).await;
                return true;
            }
        };

        let tags = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = git.tag_list(dir) => result,
        };
        let tags = match tags {
            Ok(tags) => tags,
            Err(err) => {
                self.record_git_failure(Stage::ListTags, &err).await;
                return true;
            }
        };

        let decision = detect(&self.state, &head, &tags);

        if decision.push_branches {
            tracing::debug!(job = %self.job.id, "pushing branches");
            let pushed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                result = git.push(dir, MIRROR_REMOTE, PushScope::AllBranches) => result,
            };
            if let Err(err) = pushed {
                self.record_git_failure(Stage::PushBranches, &err).await;
                return true;
            }
        }

        if decision.push_tags {
            tracing::debug!(job = %self.job.id, "pushing tags");
            let pushed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                result = git.push(dir, MIRROR_REMOTE, PushScope::TagsOnly) => result,
            };
            if let Err(err) = pushed {
                self.record_git_failure(Stage::PushTags, &err).await;
                return true;
            }
        }

        self.tracker.success(Stage::Synced, None).await;
        self.state = Snapshot::observed(head, tags);
        true
    }

    async fn record_git_failure(&self, stage: Stage, err: &GitError) {
        self.tracker
            .failure(stage, err.to_string(), err.output().map(str::to_string))
            .await;
    }

    #[cfg(test)]
    fn state(&self) -> &Snapshot {
        &self.state
    }
}

/// Delete a partially created working directory after a failed clone. A
/// missing directory is not an error; anything else is logged and the retry
/// proceeds regardless (the next clone will fail loudly if the directory is
/// truly stuck).
async fn remove_partial_clone(job: &JobSpec, dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(job = %job.id, path = %dir.display(), error = %err, "could not remove partial clone");
        }
    }
}

/// Write the credential blob with owner-only permissions set at open time;
/// the blob must never be world-readable, not even between create and chmod.
fn write_restricted(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
