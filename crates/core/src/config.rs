// SPDX-License-Identifier: MIT

//! Process-wide configuration, loaded from a single JSON file (`spec.md` §3).

use crate::package::{Package, PackageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing required settings key: {0}")]
    MissingSetting(&'static str),
    #[error(transparent)]
    Package(#[from] PackageError),
}

/// `settings.ftpsync` defaults block. Only consumed by the `ftpsync`
/// backend, but parsed here since it lives in the shared config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FtpSyncDefaults {
    #[serde(default)]
    pub maintainer: String,
    #[serde(default)]
    pub sponsor: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub throughput: String,
    #[serde(default)]
    pub include: String,
    #[serde(default)]
    pub exclude: String,
}

/// Process-wide configuration (`spec.md` §3). Replaces the source's
/// `mirror.conf` singleton — passed explicitly as part of the shared
/// `Context` the scheduler, RPC handlers, and backends all receive
/// (`spec.md` §9).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub name: String,
    pub hostname: String,
    /// Referenced but never consumed by the core; preserved as a
    /// passthrough field (`spec.md` §9).
    pub lastsettingmodified: u64,
    pub errorcontinuetime: u64,
    pub statfile: PathBuf,
    pub statusfile: PathBuf,
    pub logfolder: PathBuf,
    pub webroot: PathBuf,
    pub uid: u32,
    pub gid: u32,
    pub ftpsync: FtpSyncDefaults,
    pub maintainer: serde_json::Map<String, serde_json::Value>,
    pub localtimezone: String,
    pub plugins: Vec<String>,
    pub master_socket: PathBuf,
    pub worker_socket: PathBuf,
}

impl Config {
    /// Parse a `Config` plus the ordered package table from the raw JSON
    /// document. Iteration order of `packages` matches the source's
    /// insertion order from the config file's `packages` object
    /// (`spec.md` §9, "explicit `pkgid → Package` map, not attribute bags").
    pub fn load_from_value(
        doc: &serde_json::Value,
        known_backends: &[&str],
    ) -> Result<(Config, Vec<Package>), ConfigError> {
        let config = Self::parse_settings(doc)?;

        let packages_obj = doc
            .get("packages")
            .and_then(serde_json::Value::as_object)
            .ok_or(ConfigError::MissingSetting("packages"))?;

        let mut packages = Vec::with_capacity(packages_obj.len());
        for (pkgid, pkg_doc) in packages_obj {
            let mut pkg_doc = pkg_doc.clone();
            if let Some(obj) = pkg_doc.as_object_mut() {
                obj.entry("id").or_insert_with(|| serde_json::Value::String(pkgid.clone()));
            }
            packages.push(Package::from_dict(&pkg_doc, known_backends)?);
        }

        Ok((config, packages))
    }

    /// Parse just the `settings`/top-level fields, without touching
    /// `packages` — used by the worker process, which has no
    /// `BackendRegistry` to validate `synctype` against and no use for the
    /// package table.
    pub fn parse_settings(doc: &serde_json::Value) -> Result<Config, ConfigError> {
        let settings = doc
            .get("settings")
            .and_then(serde_json::Value::as_object)
            .ok_or(ConfigError::MissingSetting("settings"))?;

        let get_path = |key: &'static str| -> Result<PathBuf, ConfigError> {
            settings
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(PathBuf::from)
                .ok_or(ConfigError::MissingSetting(key))
        };

        Ok(Config {
            name: doc.get("mirrorname").and_then(serde_json::Value::as_str).unwrap_or("").to_string(),
            hostname: doc.get("hostname").and_then(serde_json::Value::as_str).unwrap_or("").to_string(),
            lastsettingmodified: doc
                .get("lastsettingmodified")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0),
            errorcontinuetime: settings
                .get("errorcontinuetime")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(60),
            statfile: get_path("statfile")?,
            statusfile: get_path("statusfile")?,
            logfolder: get_path("logfolder")?,
            webroot: get_path("webroot")?,
            uid: settings.get("uid").and_then(serde_json::Value::as_u64).unwrap_or(0) as u32,
            gid: settings.get("gid").and_then(serde_json::Value::as_u64).unwrap_or(0) as u32,
            ftpsync: settings
                .get("ftpsync")
                .map(|v| serde_json::from_value(v.clone()))
                .transpose()?
                .unwrap_or_default(),
            maintainer: settings
                .get("maintainer")
                .and_then(serde_json::Value::as_object)
                .cloned()
                .unwrap_or_default(),
            localtimezone: settings
                .get("localtimezone")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("UTC")
                .to_string(),
            plugins: settings
                .get("plugins")
                .and_then(serde_json::Value::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            master_socket: settings
                .get("master_socket")
                .and_then(serde_json::Value::as_str)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/run/mirrord/master.sock")),
            worker_socket: settings
                .get("worker_socket")
                .and_then(serde_json::Value::as_str)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/run/mirrord/worker.sock")),
        })
    }
}

/// Ordered `pkgid -> Package` map, replacing the source's attribute-bag
/// `Packages` class (`spec.md` §9). Backed by a declaration-ordered `Vec`
/// with a side index for O(1) lookup, since a `BTreeMap` would silently
/// reorder entries by key instead of preserving config insertion order.
#[derive(Debug, Clone, Default)]
pub struct PackageTable {
    packages: Vec<Package>,
    index: BTreeMap<crate::id::PackageId, usize>,
}

impl PackageTable {
    pub fn from_ordered(packages: Vec<Package>) -> Self {
        let mut table = Self::default();
        for pkg in packages {
            table.insert(pkg);
        }
        table
    }

    pub fn insert(&mut self, pkg: Package) {
        if let Some(&idx) = self.index.get(&pkg.pkgid) {
            self.packages[idx] = pkg;
        } else {
            self.index.insert(pkg.pkgid.clone(), self.packages.len());
            self.packages.push(pkg);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Package> {
        let idx = self.index.remove(id)?;
        let removed = self.packages.remove(idx);
        for v in self.index.values_mut() {
            if *v > idx {
                *v -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Package> {
        self.index.get(id).map(|&idx| &self.packages[idx])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Package> {
        let idx = *self.index.get(id)?;
        Some(&mut self.packages[idx])
    }

    /// Iterate in declaration order (`spec.md` §4.4: "iteration order is
    /// stable: the config's insertion order").
    pub fn iter_in_order(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn iter_in_order_mut(&mut self) -> impl Iterator<Item = &mut Package> {
        self.packages.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn ids_in_order(&self) -> Vec<crate::id::PackageId> {
        self.packages.iter().map(|p| p.pkgid.clone()).collect()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
