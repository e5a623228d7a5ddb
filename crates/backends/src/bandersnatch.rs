// SPDX-License-Identifier: MIT

//! The `bandersnatch` backend (`spec.md` §4.6, §9). The source sets
//! `ACTIVE` immediately on a successful dispatch — contradicting the
//! invariant that `ACTIVE` means "last sync succeeded." This backend only
//! ever returns [`DispatchOutcome::Dispatched`]; the scheduler reaches
//! `ACTIVE` solely through the worker's `job_finished` notification.

use crate::backend::{BackendContext, DispatchOutcome, TransferBackend};
use crate::dispatch::ExecuteCommandArgs;
use crate::error::BackendError;
use async_trait::async_trait;
use mirrord_core::{JobId, Package};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct BandersnatchBackend;

impl BandersnatchBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransferBackend for BandersnatchBackend {
    fn name(&self) -> &'static str {
        "bandersnatch"
    }

    async fn execute(
        &self,
        package: &Package,
        ctx: &BackendContext<'_>,
    ) -> Result<DispatchOutcome, BackendError> {
        let args = ExecuteCommandArgs {
            job_id: JobId::new(package.pkgid.0.clone()),
            commandline: vec!["bandersnatch".to_string(), "mirror".to_string()],
            env: BTreeMap::new(),
            sync_method: "bandersnatch",
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
#[path = "bandersnatch_tests.rs"]
mod tests;
