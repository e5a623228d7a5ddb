// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirrord-backends: the `TransferBackend` trait and the rsync/ftpsync/lftp/
//! bandersnatch/local registry (`spec.md` §4.6, §9).

mod backend;
mod bandersnatch;
mod dispatch;
mod error;
mod ftpsync;
mod lftp;
mod local;
mod registry;
mod rsync;

pub use backend::{BackendContext, DispatchOutcome, TransferBackend};
pub use bandersnatch::BandersnatchBackend;
pub use dispatch::{DispatchAck, ExecuteCommandArgs, WorkerDispatch};
pub use error::{BackendError, DispatchError};
pub use ftpsync::FtpsyncBackend;
pub use lftp::LftpBackend;
pub use local::LocalBackend;
pub use registry::BackendRegistry;
pub use rsync::RsyncBackend;

#[cfg(any(test, feature = "test-support"))]
pub use dispatch::FakeWorkerDispatch;
