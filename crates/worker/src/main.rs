// SPDX-License-Identifier: MIT

//! `mirrord-worker --config <config>` — run the worker daemon (`spec.md` §6).

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mirrord-worker", about = "Run the mirror synchronization worker daemon")]
struct Args {
    /// Path to the daemon's JSON configuration file.
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match mirrord_worker::run(&args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mirrord-worker: {err}");
            ExitCode::FAILURE
        }
    }
}
