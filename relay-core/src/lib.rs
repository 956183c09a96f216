//! Relay core library — domain types, startup configuration, errors.
//!
//! Public API surface:
//! - [`types`] — [`JobId`] and [`JobSpec`]
//! - [`config`] — [`Settings`], [`SecretResolver`], `metadata:` reconciliation
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{reconcile, NoIndirection, SecretResolver, Settings};
pub use error::ConfigError;
pub use types::{JobId, JobSpec};
