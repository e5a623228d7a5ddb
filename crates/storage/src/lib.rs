// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Persistence and reconciliation (`spec.md` §4.7): config+stat merge on
//! load, atomic rewrites with rotating backups, and the externally
//! consumed status snapshot.

pub mod atomic;
pub mod load;
pub mod snapshot;
pub mod stat;

mod error;

pub use atomic::atomic_write;
pub use error::StorageError;
pub use load::{load, load_settings, persist_stat};
pub use snapshot::{build as build_snapshot, load as load_snapshot, write as write_snapshot, PackageStatusEntry, StatusSnapshot};
pub use stat::{StatEntry, StatFile, StatusInfo};
