// SPDX-License-Identifier: MIT

//! Shared in-memory state the scheduler loop and the RPC server both touch
//! (`spec.md` §5: "one scheduler-loop thread is the only thread mutating
//! package status outside notification delivery" — enforced here by putting
//! every mutation behind the same lock rather than by convention).

use mirrord_core::{Config, PackageTable};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct MasterState {
    pub config: Config,
    pub packages: PackageTable,
}

impl MasterState {
    pub fn new(config: Config, packages: PackageTable) -> Self {
        Self { config, packages }
    }
}

pub type SharedState = Arc<Mutex<MasterState>>;

pub fn shared(config: Config, packages: PackageTable) -> SharedState {
    Arc::new(Mutex::new(MasterState::new(config, packages)))
}
