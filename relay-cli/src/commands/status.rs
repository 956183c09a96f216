//! `relay status` — print a running daemon's plain-text health report.
//!
//! Exits non-zero when the endpoint reports unhealthy, so the command doubles
//! as a probe in scripts.

use anyhow::{anyhow, Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Port of the local daemon's status endpoint.
    #[arg(long, default_value_t = 8080, conflicts_with = "url")]
    pub port: u16,

    /// Full status URL, for daemons on other hosts.
    #[arg(long)]
    pub url: Option<String>,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let url = self
            .url
            .unwrap_or_else(|| format!("http://127.0.0.1:{}/status", self.port));

        match ureq::get(&url).call() {
            Ok(response) => {
                let body = response
                    .into_string()
                    .context("could not read status response")?;
                print!("{body}");
                Ok(())
            }
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                print!("{body}");
                Err(anyhow!("status endpoint reported unhealthy (HTTP {code})"))
            }
            Err(err) => Err(err).context(format!("could not reach {url}")),
        }
    }
}
