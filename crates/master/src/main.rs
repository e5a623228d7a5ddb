// SPDX-License-Identifier: MIT

//! `mirrord-master <config>` — run the master daemon (`spec.md` §6).

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mirrord-master", about = "Run the mirror synchronization master daemon")]
struct Args {
    /// Path to the daemon's JSON configuration file.
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match mirrord_master::run(&args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mirrord-master: {err}");
            ExitCode::FAILURE
        }
    }
}
