// SPDX-License-Identifier: MIT

//! The `lftp` backend (`spec.md` §4.6): a single `lftp -c <script>` mirror
//! invocation over FTP.

use crate::backend::{BackendContext, DispatchOutcome, TransferBackend};
use crate::dispatch::ExecuteCommandArgs;
use crate::error::BackendError;
use async_trait::async_trait;
use mirrord_core::{JobId, Package};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct LftpBackend;

impl LftpBackend {
    pub fn new() -> Self {
        Self
    }

    fn build_script(package: &Package) -> String {
        let src = &package.settings.src;
        let dst = &package.settings.dst;
        format!(
            "set ftp:anon-pass mirror@{src}; set cmd:verbose yes; \
             mirror --continue --delete --no-perms --verbose=3 \
             -X '\\.(mirror|notar)' -x '\\.in\\..*\\.' -X 'lost+found' ftp://{src} {dst}"
        )
    }
}

#[async_trait]
impl TransferBackend for LftpBackend {
    fn name(&self) -> &'static str {
        "lftp"
    }

    async fn execute(
        &self,
        package: &Package,
        ctx: &BackendContext<'_>,
    ) -> Result<DispatchOutcome, BackendError> {
        let args = ExecuteCommandArgs {
            job_id: JobId::new(package.pkgid.0.clone()),
            commandline: vec!["lftp".to_string(), "-c".to_string(), Self::build_script(package)],
            env: BTreeMap::new(),
            sync_method: "lftp",
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
#[path = "lftp_tests.rs"]
mod tests;
