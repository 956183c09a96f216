//! Daemon runtime: one mirror engine task per job, the status server, and
//! shutdown wiring.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use relay_core::JobSpec;
use relay_engine::{GitCli, GitTool, MirrorEngine};
use relay_status::{StatusBoard, StatusTracker};

use crate::error::{io_err, DaemonError};
use crate::http;

/// Daemon-level knobs, resolved from settings and CLI flags before startup.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Status endpoint listen port.
    pub port: u16,
    /// Base directory for per-job working directories and cookie files.
    pub data_dir: PathBuf,
    /// Minimum spacing between sync iterations per job.
    pub sync_interval: Duration,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: DaemonConfig, jobs: Vec<JobSpec>) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, jobs))
}

/// Run the daemon until ctrl-c.
pub async fn run(config: DaemonConfig, jobs: Vec<JobSpec>) -> Result<(), DaemonError> {
    let cancel = CancellationToken::new();

    let signal_handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => tracing::info!("received ctrl-c, shutting down"),
                        Err(err) => tracing::error!(error = %err, "ctrl-c handler failed, shutting down"),
                    }
                    cancel.cancel();
                }
            }
        })
    };

    let result = run_with(config, jobs, Arc::new(GitCli::new()), cancel.clone()).await;

    // Unblock the signal task if the runtime stopped for another reason.
    cancel.cancel();
    handle_join("signal_handler", signal_handle.await)?;
    result
}

/// Runtime body with injectable git tool and cancellation, used directly by
/// tests.
pub async fn run_with(
    config: DaemonConfig,
    jobs: Vec<JobSpec>,
    git: Arc<dyn GitTool>,
    cancel: CancellationToken,
) -> Result<(), DaemonError> {
    if !config.data_dir.exists() {
        fs::create_dir_all(&config.data_dir).map_err(|e| io_err(&config.data_dir, e))?;
    }

    // Bind before spawning anything: a bad port is a startup failure, not a
    // runtime one.
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|source| DaemonError::Bind {
            port: config.port,
            source,
        })?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, jobs = jobs.len(), "relay daemon listening");
    }

    let mut trackers = Vec::with_capacity(jobs.len());
    let mut engine_handles = Vec::with_capacity(jobs.len());
    for job in jobs {
        let tracker = StatusTracker::for_job(&job);
        trackers.push(tracker.clone());
        let engine = MirrorEngine::new(
            job,
            config.data_dir.clone(),
            Arc::clone(&git),
            tracker,
            config.sync_interval,
            cancel.child_token(),
        );
        engine_handles.push(tokio::spawn(engine.run()));
    }
    let board = StatusBoard::new(trackers);

    let server_handle = {
        let cancel = cancel.clone();
        tokio::spawn(http::serve(listener, board, cancel))
    };

    // The server returns only on cancellation; engines follow their child
    // tokens down shortly after.
    handle_join("status_server", server_handle.await)??;
    for handle in engine_handles {
        handle_join("mirror_engine", handle.await)?;
    }
    Ok(())
}

fn handle_join<T>(
    task: &'static str,
    result: Result<T, tokio::task::JoinError>,
) -> Result<T, DaemonError> {
    result.map_err(|err| DaemonError::Join {
        task,
        message: err.to_string(),
    })
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
