// SPDX-License-Identifier: MIT

//! The `ftpsync` backend (`spec.md` §4.6). Builds the environment the
//! bundled `ftpsync` script expects instead of writing an `ftpsync.conf`
//! file — same per-package options, no embedded/shipped script payload.

use crate::backend::{BackendContext, DispatchOutcome, TransferBackend};
use crate::dispatch::ExecuteCommandArgs;
use crate::error::BackendError;
use async_trait::async_trait;
use mirrord_core::{JobId, Package};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct FtpsyncBackend;

impl FtpsyncBackend {
    pub fn new() -> Self {
        Self
    }

    fn str_opt(package: &Package, key: &str) -> Option<String> {
        package.settings.options.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    /// Builds the env the bundled `ftpsync` script reads, matching
    /// `ftpsync.py:_config()`'s field names exactly: most `INFO_*`/`ARCH_*`
    /// fields carry a prefix the option key itself doesn't have, so a
    /// blanket uppercase mapping silently produces the wrong variable name.
    fn build_env(package: &Package, mirrorname: &str, logfolder: &std::path::Path) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("MIRRORNAME".to_string(), mirrorname.to_string());
        env.insert("TO".to_string(), package.settings.dst.clone());
        env.insert("RSYNC_HOST".to_string(), package.settings.src.clone());

        for key in ["mailto", "hub"] {
            if let Some(value) = Self::str_opt(package, key) {
                env.insert(key.to_uppercase(), value);
            }
        }
        if let Some(path) = Self::str_opt(package, "path") {
            env.insert("RSYNC_PATH".to_string(), path);
        }
        if let (Some(user), Some(password)) = (Self::str_opt(package, "user"), Self::str_opt(package, "password")) {
            env.insert("RSYNC_USER".to_string(), user);
            env.insert("RSYNC_PASSWORD".to_string(), password);
        }

        for key in ["maintainer", "sponsor", "country", "location", "throughput"] {
            if let Some(value) = Self::str_opt(package, key) {
                env.insert(format!("INFO_{}", key.to_uppercase()), value);
            }
        }
        for key in ["arch_include", "arch_exclude"] {
            if let Some(value) = Self::str_opt(package, key) {
                env.insert(key.to_uppercase(), value);
            }
        }

        let logdir = Self::str_opt(package, "logdir").unwrap_or_else(|| logfolder.display().to_string());
        env.insert("LOGDIR".to_string(), logdir);
        env
    }
}

#[async_trait]
impl TransferBackend for FtpsyncBackend {
    fn name(&self) -> &'static str {
        "ftpsync"
    }

    async fn execute(
        &self,
        package: &Package,
        ctx: &BackendContext<'_>,
    ) -> Result<DispatchOutcome, BackendError> {
        let args = ExecuteCommandArgs {
            job_id: JobId::new(package.pkgid.0.clone()),
            commandline: vec!["ftpsync".to_string()],
            env: Self::build_env(package, ctx.mirrorname, ctx.logfolder),
            sync_method: "ftpsync",
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
#[path = "ftpsync_tests.rs"]
mod tests;
