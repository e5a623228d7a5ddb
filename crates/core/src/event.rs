// SPDX-License-Identifier: MIT

//! Event names used by the in-process event bus (`spec.md` §4.8).
//!
//! This only defines the event *shape*; dispatch (the bounded worker pool,
//! sync/async publish modes, listener-exception containment) lives in
//! `mirrord-master`, since the master is the only process with listeners in
//! this system.

use crate::id::PackageId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "MASTER.INIT.PRE")]
    MasterInitPre,
    #[serde(rename = "MASTER.INIT.POST")]
    MasterInitPost,
    #[serde(rename = "MASTER.PACKAGE_STATUS_UPDATE.PRE")]
    PackageStatusUpdatePre { pkgid: PackageId },
    #[serde(rename = "MASTER.PACKAGE_STATUS_UPDATE.POST")]
    PackageStatusUpdatePost { pkgid: PackageId },
}

impl Event {
    /// The dotted event name used for listener registration, matching the
    /// strings in `spec.md` §4.8 exactly.
    pub fn name(&self) -> &'static str {
        match self {
            Event::MasterInitPre => "MASTER.INIT.PRE",
            Event::MasterInitPost => "MASTER.INIT.POST",
            Event::PackageStatusUpdatePre { .. } => "MASTER.PACKAGE_STATUS_UPDATE.PRE",
            Event::PackageStatusUpdatePost { .. } => "MASTER.PACKAGE_STATUS_UPDATE.POST",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
