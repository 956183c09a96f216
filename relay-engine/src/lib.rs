//! # relay-engine
//!
//! The per-job mirror pipeline: the [`GitTool`] contract and its subprocess
//! implementation, the [`RateLimiter`] that paces iterations, and the
//! [`MirrorEngine`] state machine that the daemon runs once per configured
//! job.

pub mod engine;
pub mod error;
pub mod git;
pub mod limiter;

pub use engine::{MirrorEngine, CLONE_RETRY_DELAY, REMOTE_RETRY_DELAY};
pub use error::GitError;
pub use git::{GitCli, GitTool, PushScope, DEFAULT_GIT_TIMEOUT, HEAD_REF_PATH, MIRROR_REMOTE};
pub use limiter::RateLimiter;
