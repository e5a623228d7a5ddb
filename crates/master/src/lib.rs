// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirrord-master: the scheduler loop, the worker RPC client, the master
//! control socket, the event bus, and process lifecycle for the mirror
//! synchronization daemon (`spec.md` §4.4, §4.8, §5, §6).

mod error;
mod event_bus;
mod lifecycle;
mod rpc;
mod scheduler;
mod state;
mod worker_client;

pub use error::MasterError;
pub use event_bus::{EventBus, Listener};
pub use lifecycle::run;
pub use rpc::MasterRpc;
pub use scheduler::Scheduler;
pub use state::{shared, MasterState, SharedState};
pub use worker_client::{NotificationHandler, WorkerClient};
