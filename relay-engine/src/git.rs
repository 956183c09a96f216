//! External git tool contract and its subprocess implementation.
//!
//! The engine only ever talks to [`GitTool`]; [`GitCli`] is the production
//! implementation that shells out to the `git` binary. Every invocation runs
//! under a bounded timeout so a hung transport cannot stall a job's loop.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::GitError;

/// Name of the destination remote registered during bootstrap, distinct from
/// the `origin` remote created by the clone.
pub const MIRROR_REMOTE: &str = "to";

/// Relative path of the default-branch head reference inside a working
/// directory.
pub const HEAD_REF_PATH: &str = ".git/refs/heads/master";

pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Scope of a push operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushScope {
    /// `push --all <remote>`
    AllBranches,
    /// `push --tags <remote>`
    TagsOnly,
}

/// Contract for the underlying version-control tool.
///
/// All operations return the tool's combined output text on success; failures
/// carry the output inside [`GitError`]. Implementations must be safe to
/// share across jobs: per-job state lives in the working directory, not in
/// the tool.
#[async_trait]
pub trait GitTool: Send + Sync {
    async fn clone_repo(&self, from: &str, dir: &Path) -> Result<String, GitError>;
    async fn pull(&self, dir: &Path) -> Result<String, GitError>;
    async fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<String, GitError>;
    async fn set_config(&self, dir: &Path, key: &str, value: &str) -> Result<String, GitError>;
    async fn push(&self, dir: &Path, remote: &str, scope: PushScope) -> Result<String, GitError>;
    /// Full tag list, in the tool's own order.
    async fn tag_list(&self, dir: &Path) -> Result<Vec<String>, GitError>;
    /// Current head value of the local default branch.
    async fn head_ref(&self, dir: &Path) -> Result<String, GitError>;
}

/// `GitTool` implementation spawning the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    timeout: Duration,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_GIT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn git_in(dir: &Path) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir);
        cmd
    }

    /// Run a prepared git command to completion, capturing combined output.
    /// On timeout the child is killed (`kill_on_drop`) and the operation
    /// reports [`GitError::TimedOut`].
    async fn run(&self, operation: &'static str, mut cmd: Command) -> Result<String, GitError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let finished = async {
            let out = cmd
                .output()
                .await
                .map_err(|source| GitError::Spawn { operation, source })?;
            let combined = combine_output(&out.stdout, &out.stderr);
            if out.status.success() {
                Ok(combined)
            } else {
                Err(GitError::CommandFailed {
                    operation,
                    status: out.status.to_string(),
                    output: combined,
                })
            }
        };

        match tokio::time::timeout(self.timeout, finished).await {
            Ok(result) => result,
            Err(_) => Err(GitError::TimedOut {
                operation,
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl GitTool for GitCli {
    async fn clone_repo(&self, from: &str, dir: &Path) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg(from).arg(dir);
        self.run("clone", cmd).await
    }

    async fn pull(&self, dir: &Path) -> Result<String, GitError> {
        let mut cmd = Self::git_in(dir);
        cmd.arg("pull");
        self.run("pull", cmd).await
    }

    async fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<String, GitError> {
        let mut cmd = Self::git_in(dir);
        cmd.args(["remote", "add", name]).arg(url);
        self.run("remote add", cmd).await
    }

    async fn set_config(&self, dir: &Path, key: &str, value: &str) -> Result<String, GitError> {
        let mut cmd = Self::git_in(dir);
        cmd.arg("config").arg(key).arg(value);
        self.run("config", cmd).await
    }

    async fn push(&self, dir: &Path, remote: &str, scope: PushScope) -> Result<String, GitError> {
        let mut cmd = Self::git_in(dir);
        match scope {
            PushScope::AllBranches => cmd.args(["push", "--all", remote]),
            PushScope::TagsOnly => cmd.args(["push", "--tags", remote]),
        };
        self.run("push", cmd).await
    }

    async fn tag_list(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        let mut cmd = Self::git_in(dir);
        cmd.args(["tag", "-l"]);
        let output = self.run("tag -l", cmd).await?;
        Ok(parse_tag_lines(&output))
    }

    /// Reads the ref file directly instead of spawning `git rev-parse`;
    /// cheaper, and the value is only ever compared for equality. The trait
    /// boundary keeps a command-based implementation substitutable.
    async fn head_ref(&self, dir: &Path) -> Result<String, GitError> {
        let path = head_ref_path(dir);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents.trim_end().to_string()),
            Err(source) => Err(GitError::RefRead { path, source }),
        }
    }
}

/// Absolute path of the default-branch ref file for a working directory.
pub fn head_ref_path(dir: &Path) -> PathBuf {
    dir.join(HEAD_REF_PATH)
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    let err = String::from_utf8_lossy(stderr);
    if !err.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&err);
    }
    combined
}

fn parse_tag_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tag_lines_preserve_order_and_skip_blanks() {
        assert_eq!(
            parse_tag_lines("v1.1\nv1.0\n\nv2.0\n"),
            vec!["v1.1", "v1.0", "v2.0"]
        );
        assert!(parse_tag_lines("").is_empty());
    }

    #[test]
    fn combined_output_joins_streams() {
        assert_eq!(combine_output(b"out", b"err"), "out\nerr");
        assert_eq!(combine_output(b"out\n", b"err"), "out\nerr");
        assert_eq!(combine_output(b"", b"err"), "err");
        assert_eq!(combine_output(b"out", b""), "out");
    }

    #[tokio::test]
    async fn head_ref_reads_and_trims_the_ref_file() {
        let dir = TempDir::new().expect("tempdir");
        let refs = dir.path().join(".git/refs/heads");
        std::fs::create_dir_all(&refs).expect("mkdir");
        std::fs::write(refs.join("master"), "abc123\n").expect("write ref");

        let git = GitCli::new();
        let head = git.head_ref(dir.path()).await.expect("head");
        assert_eq!(head, "abc123");
    }

    #[tokio::test]
    async fn missing_head_ref_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let git = GitCli::new();
        let err = git.head_ref(dir.path()).await.expect_err("no ref");
        assert!(matches!(err, GitError::RefRead { .. }));
        assert!(err.output().is_none());
    }

    #[test]
    fn command_failure_display_omits_output() {
        let err = GitError::CommandFailed {
            operation: "pull",
            status: "exit status: 128".to_string(),
            output: "fatal: could not read from remote".to_string(),
        };
        assert_eq!(err.to_string(), "git pull: exit status: 128");
        assert_eq!(err.output(), Some("fatal: could not read from remote"));
    }
}
