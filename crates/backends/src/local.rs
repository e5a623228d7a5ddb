// SPDX-License-Identifier: MIT

//! The `local` backend (`spec.md` glossary: "a named strategy for executing
//! one sync" — covers filesystem-to-filesystem mirrors with no network
//! transport). Delegates to `rsync -a --delete` between two local paths.

use crate::backend::{BackendContext, DispatchOutcome, TransferBackend};
use crate::dispatch::ExecuteCommandArgs;
use crate::error::BackendError;
use async_trait::async_trait;
use mirrord_core::{JobId, Package};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransferBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn execute(
        &self,
        package: &Package,
        ctx: &BackendContext<'_>,
    ) -> Result<DispatchOutcome, BackendError> {
        let args = ExecuteCommandArgs {
            job_id: JobId::new(package.pkgid.0.clone()),
            commandline: vec![
                "rsync".to_string(),
                "-a".to_string(),
                "--delete".to_string(),
                package.settings.src.clone(),
                package.settings.dst.clone(),
            ],
            env: BTreeMap::new(),
            sync_method: "local",
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
#[path = "local_tests.rs"]
mod tests;
