// SPDX-License-Identifier: MIT

//! The stat file: the merge-target of config and observed status
//! (`spec.md` §3, §4.7).

use mirrord_core::{Package, PackageId, PackageStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    #[serde(default)]
    pub errorcount: u32,
    #[serde(default)]
    pub lastsync: f64,
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub status: PackageStatus,
    pub statusinfo: StatusInfo,
}

impl From<&Package> for StatEntry {
    fn from(p: &Package) -> Self {
        StatEntry {
            status: p.status,
            statusinfo: StatusInfo { errorcount: p.errorcount, lastsync: p.lastsync, timestamp: p.timestamp },
        }
    }
}

/// `{pkgid -> StatEntry}`, as read from / written to the stat file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatFile(pub BTreeMap<String, StatEntry>);

impl StatFile {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, pkgid: &PackageId) -> Option<&StatEntry> {
        self.0.get(pkgid.as_str())
    }

    /// Apply a stored entry's runtime fields onto a freshly-parsed `Package`
    /// (which otherwise defaults to `UNKNOWN`/`errorcount=0`). Seeds
    /// newcomers per P4: absent from the stat file means leave the
    /// just-parsed defaults in place.
    pub fn apply_to(&self, pkg: &mut Package) {
        if let Some(entry) = self.get(&pkg.pkgid) {
            pkg.status = entry.status;
            pkg.errorcount = entry.statusinfo.errorcount;
            pkg.lastsync = entry.statusinfo.lastsync;
            pkg.timestamp = entry.statusinfo.timestamp;
        }
    }

    /// Rebuild the stat file from the current in-memory package set. Any
    /// `pkgid` not present in `packages` is dropped — this is P3
    /// (reconciliation drops orphans).
    pub fn rebuild(packages: &[Package]) -> Self {
        Self(packages.iter().map(|p| (p.pkgid.0.clone(), StatEntry::from(p))).collect())
    }
}

#[cfg(test)]
#[path = "stat_tests.rs"]
mod tests;
