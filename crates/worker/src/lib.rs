// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirrord-worker: the job supervisor, its control socket, and process
//! lifecycle for the mirror synchronization daemon (`spec.md` §4.5, §5, §6).

mod clients;
mod error;
mod job;
mod lifecycle;
mod rpc;

pub use clients::{ClientHandle, ClientRegistry};
pub use error::WorkerError;
pub use job::{JobRegistry, JobSnapshot};
pub use lifecycle::run;
pub use rpc::WorkerRpc;
