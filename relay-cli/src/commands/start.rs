//! `relay start` — resolve configuration and run the daemon in the
//! foreground.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use relay_core::Settings;
use relay_daemon::{start_blocking, DaemonConfig};

use crate::secrets::MetadataResolver;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Status endpoint listen port (overrides $PORT, default 8080).
    #[arg(long)]
    pub port: Option<u16>,

    /// Base directory for repository working copies (overrides
    /// $RELAY_DATA_DIR, default ~/.relay).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum seconds between sync iterations per job (overrides
    /// $SYNC_INTERVAL_SECS, default 60).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: Option<u64>,
}

impl StartArgs {
    pub fn run(self) -> Result<()> {
        let resolver = MetadataResolver::from_env();
        let settings = Settings::from_env(&resolver).context("invalid configuration")?;

        let config = DaemonConfig {
            port: self.port.unwrap_or(settings.port),
            sync_interval: self
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(settings.sync_interval),
            data_dir: match self.data_dir.or(settings.data_dir) {
                Some(dir) => dir,
                None => default_data_dir()?,
            },
        };

        start_blocking(config, settings.jobs).context("daemon exited with error")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".relay"))
}
