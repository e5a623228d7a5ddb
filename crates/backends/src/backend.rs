// SPDX-License-Identifier: MIT

//! The uniform backend shape (`spec.md` §4.6): gather options, build a
//! command, delegate to the worker, never wait for completion.

use crate::dispatch::WorkerDispatch;
use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{Datelike, Local, Timelike};
use mirrord_core::Package;
use std::path::PathBuf;

/// Daemon-wide identity and logging defaults a backend needs but does not
/// own — these come from [`mirrord_core::Config`], not `package.settings`.
pub struct BackendContext<'a> {
    pub dispatch: &'a (dyn WorkerDispatch + 'a),
    pub uid: u32,
    pub gid: u32,
    pub logfolder: &'a PathBuf,
    pub mirrorname: &'a str,
}

impl<'a> BackendContext<'a> {
    pub fn new(
        dispatch: &'a (dyn WorkerDispatch + 'a),
        uid: u32,
        gid: u32,
        logfolder: &'a PathBuf,
        mirrorname: &'a str,
    ) -> Self {
        Self { dispatch, uid, gid, logfolder, mirrorname }
    }

    /// Per-package log file path:
    /// `<logfolder>/<year>/<month>/<day>/<hh:mm:ss.µs>.<pkgid>.log`, matching
    /// the source's `create_logger`/`_time_formatting` dated-folder naming
    /// (`mirror/logger/core.py`): zero-padded `year/month/day` folders, a
    /// zero-padded `hour:minute:second.microsecond` filename stem.
    pub fn log_path(&self, pkgid: &str) -> PathBuf {
        let now = Local::now();
        self.logfolder
            .join(format!("{:04}", now.year()))
            .join(format!("{:02}", now.month()))
            .join(format!("{:02}", now.day()))
            .join(format!(
                "{:02}:{:02}:{:02}.{:06}.{pkgid}.log",
                now.hour(),
                now.minute(),
                now.second(),
                now.timestamp_subsec_micros(),
            ))
    }
}

/// What a dispatch attempt settled on. The scheduler applies the
/// corresponding status transition; backends never mutate `Package`
/// themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A job was handed to the worker; scheduler records `lastsync = now`
    /// and transitions to `SYNC`. `ACTIVE` is reached only through the
    /// worker's `job_finished` notification — never directly on dispatch
    /// (`spec.md` §9 Open Question, resolved: align all backends).
    Dispatched,
    /// The `rsync` FFTS probe found no delta; no job was started, scheduler
    /// transitions straight to `ACTIVE` with `lastsync = now`.
    UpToDate,
}

#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// The name this backend is registered under; must match `synctype`.
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        package: &Package,
        ctx: &BackendContext<'_>,
    ) -> Result<DispatchOutcome, BackendError>;
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
