// SPDX-License-Identifier: MIT

//! The `rsync` backend and its FFTS freshness probe (`spec.md` §4.6).
//!
//! FFTS ("fast freshness test sync") is a synchronous dry-run of a single
//! timestamp-manifest file, issued from the scheduler side with a short
//! connect timeout, before paying for a full `execute_command` round trip.

use crate::backend::{BackendContext, DispatchOutcome, TransferBackend};
use crate::dispatch::ExecuteCommandArgs;
use crate::error::BackendError;
use async_trait::async_trait;
use mirrord_core::{JobId, Package};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::process::Command;

const FFTS_CONTIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct RsyncBackend;

enum ProbeResult {
    UpToDate,
    NeedsSync,
}

impl RsyncBackend {
    pub fn new() -> Self {
        Self
    }

    fn auth_env(package: &Package) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        let opts = &package.settings.options;
        if opts.get("auth").and_then(|v| v.as_bool()).unwrap_or(false) {
            if let Some(user) = opts.get("user").and_then(|v| v.as_str()) {
                env.insert("USER".to_string(), user.to_string());
            }
            if let Some(password) = opts.get("password").and_then(|v| v.as_str()) {
                env.insert("RSYNC_PASSWORD".to_string(), password.to_string());
            }
        }
        env
    }

    fn build_sync_commandline(package: &Package) -> Vec<String> {
        vec![
            "rsync".to_string(),
            "-vrlptDSH".to_string(),
            "--exclude=*.~tmp~".to_string(),
            "--delete-delay".to_string(),
            "--delay-updates".to_string(),
            package.settings.src.clone(),
            package.settings.dst.clone(),
        ]
    }

    /// Empty stdout -> up to date. Non-empty stdout or a non-zero exit ->
    /// assume an update is needed (conservative). Any failure to even
    /// launch the probe is treated the same way: fall through to a full
    /// sync rather than silently skipping one.
    async fn ffts_probe(package: &Package) -> ProbeResult {
        let opts = &package.settings.options;
        if !opts.get("ffts").and_then(|v| v.as_bool()).unwrap_or(false) {
            return ProbeResult::NeedsSync;
        }
        let Some(fftsfile) = opts.get("fftsfile").and_then(|v| v.as_str()) else {
            return ProbeResult::NeedsSync;
        };

        let src = format!("{}/{}", package.settings.src, fftsfile);
        let dst = format!("{}/{}", package.settings.dst, fftsfile);
        let contimeout = format!("--contimeout={FFTS_CONTIMEOUT_SECS}");

        let mut cmd = Command::new("rsync");
        cmd.args(["--no-motd", "--dry-run", "--out-format=%n", &contimeout, &src, &dst]);
        cmd.envs(Self::auth_env(package));

        let run = tokio::time::timeout(Duration::from_secs(FFTS_CONTIMEOUT_SECS + 5), cmd.output()).await;
        match run {
            Ok(Ok(output)) if output.status.success() => {
                if output.stdout.is_empty() {
                    ProbeResult::UpToDate
                } else {
                    ProbeResult::NeedsSync
                }
            }
            _ => ProbeResult::NeedsSync,
        }
    }
}

#[async_trait]
impl TransferBackend for RsyncBackend {
    fn name(&self) -> &'static str {
        "rsync"
    }

    async fn execute(
        &self,
        package: &Package,
        ctx: &BackendContext<'_>,
    ) -> Result<DispatchOutcome, BackendError> {
        if matches!(Self::ffts_probe(package).await, ProbeResult::UpToDate) {
            tracing::info!(pkgid = %package.pkgid, "FFTS probe found no delta, skipping sync");
            return Ok(DispatchOutcome::UpToDate);
        }

        let args = ExecuteCommandArgs {
            job_id: JobId::new(package.pkgid.0.clone()),
            commandline: Self::build_sync_commandline(package),
            env: Self::auth_env(package),
            sync_method: "rsync",
            uid: Some(ctx.uid),
            gid: Some(ctx.gid),
            nice: None,
            log_path: Some(ctx.log_path(&package.pkgid.0)),
        };
        ctx.dispatch.execute_command(args).await?;
        Ok(DispatchOutcome::Dispatched)
    }
}

#[cfg(test)]
#[path = "rsync_tests.rs"]
mod tests;
