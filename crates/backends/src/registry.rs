// SPDX-License-Identifier: MIT

//! Explicit backend registry, populated once at startup.
//!
//! Replaces the source's directory-scan plugin loader (`spec.md` §9
//! REDESIGN FLAGS: "Dynamic module loading as a backend registry"). Unknown
//! `synctype` in config is a startup error (`mirrord_core::Package::from_dict`
//! already enforces this against the registry's name set).

use crate::backend::TransferBackend;
use crate::bandersnatch::BandersnatchBackend;
use crate::ftpsync::FtpsyncBackend;
use crate::lftp::LftpBackend;
use crate::local::LocalBackend;
use crate::rsync::RsyncBackend;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<&'static str, Arc<dyn TransferBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn TransferBackend>) {
        self.backends.insert(backend.name(), backend);
    }

    pub fn get(&self, synctype: &str) -> Option<Arc<dyn TransferBackend>> {
        self.backends.get(synctype).cloned()
    }

    /// Names of every registered backend, for validating `synctype` at
    /// config load time.
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.keys().copied().collect()
    }

    /// The registry this daemon ships: rsync, ftpsync, lftp, bandersnatch,
    /// local.
    pub fn with_default_backends() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RsyncBackend::new()));
        registry.register(Arc::new(FtpsyncBackend::new()));
        registry.register(Arc::new(LftpBackend::new()));
        registry.register(Arc::new(BandersnatchBackend::new()));
        registry.register(Arc::new(LocalBackend::new()));
        registry
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
