// SPDX-License-Identifier: MIT

//! `mirrordctl` — the admin and lifecycle CLI for the mirror synchronization
//! daemon pair (`spec.md` §6).

mod client;
mod color;
mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use error::CliError;

#[derive(Parser)]
#[command(name = "mirrordctl", about = "Control the mirror synchronization daemons", styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the master daemon in the foreground.
    Daemon {
        /// Path to the daemon's JSON configuration file.
        config: PathBuf,
    },
    /// Run the worker daemon in the foreground.
    Worker {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Emit one crontab line per time-scheduled package.
    Crontab {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// One-shot root bootstrap of config, runtime directories, and systemd units.
    Setup,
    /// Check that the master is alive.
    Ping {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the master's role, version, and socket path.
    Status {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List every configured package and its current status.
    ListPackages {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the full record for one package.
    GetPackage {
        #[arg(short, long)]
        config: PathBuf,
        package_id: String,
    },
    /// Force an immediate resync of one package.
    StartSync {
        #[arg(short, long)]
        config: PathBuf,
        package_id: String,
    },
    /// Cancel the in-flight sync of one package.
    StopSync {
        #[arg(short, long)]
        config: PathBuf,
        package_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let result = dispatch(cli.command).await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mirrordctl: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command) -> Result<(), CliError> {
    match command {
        Command::Daemon { config } => commands::run::daemon(&config).await,
        Command::Worker { config } => commands::run::worker(&config).await,
        Command::Crontab { user, config } => commands::crontab::run(&user, &config).await,
        Command::Setup => commands::setup::run(),
        Command::Ping { config } => commands::admin::ping(&config).await,
        Command::Status { config } => commands::admin::status(&config).await,
        Command::ListPackages { config } => commands::admin::list_packages(&config).await,
        Command::GetPackage { config, package_id } => commands::admin::get_package(&config, &package_id).await,
        Command::StartSync { config, package_id } => commands::admin::start_sync(&config, &package_id).await,
        Command::StopSync { config, package_id } => commands::admin::stop_sync(&config, &package_id).await,
    }
}
