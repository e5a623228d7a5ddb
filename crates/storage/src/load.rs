// SPDX-License-Identifier: MIT

//! Config + stat reconciliation (`spec.md` §4.7's five-step `load()`).

use crate::atomic::atomic_write;
use crate::error::StorageError;
use crate::stat::StatFile;
use mirrord_core::{Config, PackageTable};
use std::path::Path;

/// Load configuration, reconcile it against the stat file, and persist the
/// merged result.
///
/// 1. Read and parse the config file.
/// 2. Read the stat file if present, else treat as empty.
/// 3. For every `pkgid` in config, take the config entry and restore
///    `status`/`statusinfo` from the stat file when present (P4: absent
///    entries keep the freshly-parsed `UNKNOWN` defaults).
/// 4. Write the merged stat atomically (P3: `pkgid`s dropped from config are
///    dropped from the rewritten file — `StatFile::rebuild` only walks the
///    current package set).
/// 5. Return the in-memory `Config` and `PackageTable`.
pub fn load(
    config_path: &Path,
    known_backends: &[&str],
) -> Result<(Config, PackageTable), StorageError> {
    let config_bytes = std::fs::read(config_path)
        .map_err(|e| StorageError::Read { path: config_path.to_path_buf(), source: e })?;
    let doc: serde_json::Value = serde_json::from_slice(&config_bytes)
        .map_err(|e| StorageError::Parse { path: config_path.to_path_buf(), source: e })?;

    let (config, mut packages) = Config::load_from_value(&doc, known_backends)?;

    let stat = if config.statfile.exists() {
        let bytes = std::fs::read(&config.statfile)
            .map_err(|e| StorageError::Read { path: config.statfile.clone(), source: e })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Parse { path: config.statfile.clone(), source: e })?
    } else {
        StatFile::empty()
    };

    for pkg in &mut packages {
        stat.apply_to(pkg);
    }

    persist_stat(&config.statfile, &packages)?;

    Ok((config, PackageTable::from_ordered(packages)))
}

/// Parse just the config file's `settings` block, skipping stat
/// reconciliation and package/backend validation entirely. Used by the
/// worker process, which has no `BackendRegistry` and no use for the
/// package table — only `worker_socket`, `logfolder`, and the default
/// `uid`/`gid` it runs jobs as.
pub fn load_settings(config_path: &Path) -> Result<Config, StorageError> {
    let config_bytes = std::fs::read(config_path)
        .map_err(|e| StorageError::Read { path: config_path.to_path_buf(), source: e })?;
    let doc: serde_json::Value = serde_json::from_slice(&config_bytes)
        .map_err(|e| StorageError::Parse { path: config_path.to_path_buf(), source: e })?;
    Ok(Config::parse_settings(&doc)?)
}

/// Rebuild and atomically rewrite the stat file from the current package
/// set. Called after `load()` and after every settled status transition.
pub fn persist_stat(statfile: &Path, packages: &[mirrord_core::Package]) -> Result<(), StorageError> {
    let merged = StatFile::rebuild(packages);
    let bytes = serde_json::to_vec_pretty(&merged)
        .map_err(|e| StorageError::Parse { path: statfile.to_path_buf(), source: e })?;
    atomic_write(statfile, &bytes)
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
