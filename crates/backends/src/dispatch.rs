// SPDX-License-Identifier: MIT

//! The narrow interface a backend uses to hand a built command to the
//! worker. `mirrord-master` supplies the real implementation over the
//! worker control socket; `test-support` supplies a fake for other crates'
//! tests.

use crate::error::DispatchError;
use async_trait::async_trait;
use mirrord_core::JobId;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything `execute_command` needs for one dispatch attempt. Backend
/// fields (`commandline`, `sync_method`, backend-derived `env`) come from
/// the backend; identity fields (`uid`, `gid`, `nice`, `log_path`) come from
/// the daemon-wide [`crate::BackendContext`].
#[derive(Debug, Clone)]
pub struct ExecuteCommandArgs {
    pub job_id: JobId,
    pub commandline: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub sync_method: &'static str,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub nice: Option<i32>,
    pub log_path: Option<PathBuf>,
}

/// Acknowledgement of a successfully started job.
#[derive(Debug, Clone, Copy)]
pub struct DispatchAck {
    pub job_pid: u32,
}

#[async_trait]
pub trait WorkerDispatch: Send + Sync {
    async fn execute_command(&self, args: ExecuteCommandArgs) -> Result<DispatchAck, DispatchError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::{DispatchAck, DispatchError, ExecuteCommandArgs, WorkerDispatch};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One recorded `execute_command` call.
    #[derive(Debug, Clone)]
    pub struct DispatchCall {
        pub job_id: String,
        pub commandline: Vec<String>,
        pub sync_method: String,
    }

    struct FakeState {
        calls: Vec<DispatchCall>,
        next_pid: u32,
    }

    /// Records every dispatch it receives and always acknowledges with a
    /// synthetic pid. Construct with [`FakeWorkerDispatch::failing`] to make
    /// every call return [`DispatchError::Rejected`] instead.
    #[derive(Clone)]
    pub struct FakeWorkerDispatch {
        inner: Arc<Mutex<FakeState>>,
        fail: bool,
    }

    impl Default for FakeWorkerDispatch {
        fn default() -> Self {
            Self { inner: Arc::new(Mutex::new(FakeState { calls: Vec::new(), next_pid: 1000 })), fail: false }
        }
    }

    impl FakeWorkerDispatch {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self { fail: true, ..Self::default() }
        }

        pub fn calls(&self) -> Vec<DispatchCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl WorkerDispatch for FakeWorkerDispatch {
        async fn execute_command(&self, args: ExecuteCommandArgs) -> Result<DispatchAck, DispatchError> {
            let mut state = self.inner.lock();
            state.calls.push(DispatchCall {
                job_id: args.job_id.0.clone(),
                commandline: args.commandline.clone(),
                sync_method: args.sync_method.to_string(),
            });
            if self.fail {
                return Err(DispatchError::Rejected { status: 500, message: "fake failure".to_string() });
            }
            let pid = state.next_pid;
            state.next_pid += 1;
            Ok(DispatchAck { job_pid: pid })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorkerDispatch;

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
