// SPDX-License-Identifier: MIT

//! The external status snapshot: derived, never read back by the daemon
//! (`spec.md` §3, §4.7).

use crate::atomic::atomic_write;
use crate::error::StorageError;
use mirrord_core::{duration, Config, Package};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageStatusEntry {
    pub name: String,
    pub id: String,
    pub status: String,
    pub synctype: String,
    pub syncrate: String,
    pub syncurl: String,
    pub href: String,
    pub lastsync: f64,
    pub links: Vec<mirrord_core::Link>,
}

impl From<&Package> for PackageStatusEntry {
    fn from(p: &Package) -> Self {
        PackageStatusEntry {
            name: p.name.clone(),
            id: p.pkgid.0.clone(),
            status: p.status.to_string(),
            synctype: p.synctype.clone(),
            syncrate: duration::format(p.syncrate).unwrap_or_default(),
            syncurl: p.settings.src.clone(),
            href: p.href.clone(),
            lastsync: p.lastsync,
            links: p.link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub mirrorname: String,
    /// Milliseconds since epoch. See DESIGN.md for the resolution of the
    /// source's inconsistent `timestamp` units (`spec.md` §9 open question).
    pub lastupdate: u64,
    pub lists: Vec<String>,
    #[serde(flatten)]
    pub packages: BTreeMap<String, PackageStatusEntry>,
}

/// Build the externally-consumed snapshot from the current in-memory state.
/// Regenerated after every status transition settles (`spec.md` §4.7).
pub fn build(config: &Config, packages: &[Package], now_ms: u64) -> StatusSnapshot {
    let lists = packages.iter().map(|p| p.pkgid.0.clone()).collect();
    let entries = packages.iter().map(|p| (p.pkgid.0.clone(), PackageStatusEntry::from(p))).collect();
    StatusSnapshot { mirrorname: config.name.clone(), lastupdate: now_ms, lists, packages: entries }
}

pub fn write(path: &Path, snapshot: &StatusSnapshot) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| StorageError::Parse { path: path.to_path_buf(), source: e })?;
    atomic_write(path, &bytes)
}

/// Load a previously-written snapshot, or an empty one if the file doesn't
/// exist yet (`spec.md` §4.7 step 6).
pub fn load(path: &Path, mirrorname: &str) -> Result<StatusSnapshot, StorageError> {
    if !path.exists() {
        return Ok(StatusSnapshot {
            mirrorname: mirrorname.to_string(),
            lastupdate: 0,
            lists: Vec::new(),
            packages: BTreeMap::new(),
        });
    }
    let bytes =
        std::fs::read(path).map_err(|e| StorageError::Read { path: path.to_path_buf(), source: e })?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Parse { path: path.to_path_buf(), source: e })
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
