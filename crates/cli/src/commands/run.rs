// SPDX-License-Identifier: MIT

//! `daemon <config>` / `worker --config <config>` — thin passthroughs that
//! spawn the standalone `mirrord-master`/`mirrord-worker` binaries in the
//! foreground and forward their exit status (`spec.md` §6).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::CliError;

pub async fn daemon(config: &Path) -> Result<(), CliError> {
    run_sibling_binary("mirrord-master", &[config.as_os_str()])
}

pub async fn worker(config: &Path) -> Result<(), CliError> {
    run_sibling_binary("mirrord-worker", &[std::ffi::OsStr::new("--config"), config.as_os_str()])
}

/// Find `name` next to the running `mirrordctl` binary, falling back to
/// `PATH`, and run it to completion with inherited stdio.
fn run_sibling_binary(name: &'static str, args: &[&std::ffi::OsStr]) -> Result<(), CliError> {
    let binary = find_sibling_binary(name).ok_or(CliError::BinaryNotFound(name))?;
    let status = Command::new(binary).args(args).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::ChildExited { binary: name, status })
    }
}

fn find_sibling_binary(name: &'static str) -> Option<PathBuf> {
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    which(name)
}

/// A minimal `PATH` lookup — the full `which` crate pulls in more than this
/// one-shot call needs.
fn which(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).map(|dir| dir.join(name)).find(|candidate| candidate.is_file())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
