//! Relay — continuous repository mirroring daemon.
//!
//! # Usage
//!
//! ```text
//! relay start [--port <port>] [--data-dir <path>] [--interval-secs <secs>]
//! relay status [--port <port>] [--url <url>]
//! ```
//!
//! Jobs come from the environment: `REPOS` (JSON list of
//! `{"ID", "From", "To", "HTTPCookie"}` objects) or a legacy
//! `FROM_REPO`/`TO_REPO` pair. Values prefixed `metadata:` are resolved
//! through the host metadata service at startup.

mod commands;
mod secrets;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{start::StartArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Continuously mirror git repositories to destination remotes",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the mirror daemon in the foreground.
    Start(StartArgs),

    /// Query a running daemon's status endpoint.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Start(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
