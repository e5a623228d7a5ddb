// SPDX-License-Identifier: MIT

//! Typed response payloads carried in `Response.data` (`spec.md` §6).

use mirrord_core::{JobId, Package, PackageId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub pkgid: PackageId,
    pub name: String,
    pub status: String,
    pub synctype: String,
    pub syncrate: String,
    pub lastsync: f64,
    pub errorcount: u32,
    pub disabled: bool,
    pub href: String,
}

impl From<&Package> for PackageSummary {
    fn from(p: &Package) -> Self {
        PackageSummary {
            pkgid: p.pkgid.clone(),
            name: p.name.clone(),
            status: p.status.to_string(),
            synctype: p.synctype.clone(),
            syncrate: mirrord_core::duration::format(p.syncrate).unwrap_or_default(),
            lastsync: p.lastsync,
            errorcount: p.errorcount,
            disabled: p.disabled,
            href: p.href.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterStatusInfo {
    pub running: bool,
    pub role: String,
    pub version: String,
    pub socket: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatusInfo {
    pub running: bool,
    pub role: String,
    pub version: String,
    pub socket: String,
    pub active_jobs: Vec<JobId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStartedInfo {
    pub job_id: JobId,
    pub status: String,
    pub job_pid: u32,
}

impl JobStartedInfo {
    pub fn new(job_id: JobId, job_pid: u32) -> Self {
        Self { job_id, status: "started".to_string(), job_pid }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgressInfo {
    pub job_id: JobId,
    pub running: bool,
    pub uptime_secs: u64,
    pub pid: u32,
    /// Trailing bytes of the job's captured output, up to the ring
    /// buffer's cap; empty for jobs started with a `log_path` (their
    /// output goes straight to the file, not through the buffer).
    pub recent_output: String,
}

#[cfg(test)]
#[path = "dto_tests.rs"]
mod tests;
