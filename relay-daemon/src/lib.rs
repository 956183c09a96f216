//! Daemon runtime: per-job mirror engines + HTTP status endpoint.

mod error;
mod http;
mod runtime;

pub use error::DaemonError;
pub use runtime::{run, run_with, start_blocking, DaemonConfig};
