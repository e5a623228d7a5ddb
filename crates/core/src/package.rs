// SPDX-License-Identifier: MIT

//! The declared mirror target and its runtime state (`spec.md` §3, §4.3).

use crate::id::PackageId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Runtime lifecycle state of a [`Package`]. See `spec.md` §4.3 for the full
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "SYNC")]
    Sync,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

crate::simple_display! {
    PackageStatus {
        Active => "ACTIVE",
        Sync => "SYNC",
        Error => "ERROR",
        Unknown => "UNKNOWN",
    }
}

impl Default for PackageStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// A transition this operation refuses to perform. Production code logs and
/// rejects; debug builds may choose to panic at the call site instead — see
/// `spec.md` §4.3 ("invalid target → log-and-reject in production, raise in
/// debug").
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid package status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: PackageStatus,
    pub to: PackageStatus,
}

/// A link record advertised alongside a package (e.g. a web/rsync mirror
/// of the same content under a different transport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// Backend-interpreted settings bag. `options` is intentionally opaque —
/// the core never inspects it, only the selected [`crate`]-external backend
/// does (`spec.md` §4.6 step 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSettings {
    #[serde(default)]
    pub hidden: bool,
    pub src: String,
    pub dst: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl PackageSettings {
    pub fn from_dict(data: &Map<String, Value>) -> Result<Self, PackageError> {
        serde_json::from_value(Value::Object(data.clone())).map_err(PackageError::Malformed)
    }

    pub fn to_dict(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("synctype {0:?} is not a registered backend")]
    UnknownSyncType(String),
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
    #[error("malformed package config: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// A declared mirror target (`spec.md` §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub pkgid: PackageId,
    pub name: String,
    pub status: PackageStatus,
    pub href: String,
    pub synctype: String,
    /// Seconds; `-1` is the push-only sentinel (never due by time).
    pub syncrate: i64,
    pub link: Vec<Link>,
    pub settings: PackageSettings,
    /// Seconds since epoch (float, matching the source's `time.time()`).
    pub lastsync: f64,
    pub errorcount: u32,
    pub disabled: bool,
    /// Milliseconds since epoch of the last status transition.
    pub timestamp: u64,
}

impl Package {
    /// Construct a `Package` from a decoded config entry, validating
    /// `synctype` against the set of registered backend names.
    ///
    /// Mirrors the source's `Package.from_dict`, with `known_backends`
    /// standing in for the dynamically-loaded `mirror.sync.methods` set —
    /// per `spec.md` §9, the registry is populated explicitly at startup,
    /// not discovered by scanning a directory.
    pub fn from_dict(config: &Value, known_backends: &[&str]) -> Result<Self, PackageError> {
        let obj = config.as_object().ok_or(PackageError::MissingField("<root>"))?;

        let pkgid = obj.get("id").and_then(Value::as_str).ok_or(PackageError::MissingField("id"))?;
        let name = obj.get("name").and_then(Value::as_str).ok_or(PackageError::MissingField("name"))?;
        let href = obj.get("href").and_then(Value::as_str).ok_or(PackageError::MissingField("href"))?;
        let synctype =
            obj.get("synctype").and_then(Value::as_str).ok_or(PackageError::MissingField("synctype"))?;
        if !known_backends.contains(&synctype) {
            return Err(PackageError::UnknownSyncType(synctype.to_string()));
        }

        let syncrate_raw = obj.get("syncrate").and_then(Value::as_str).unwrap_or("");
        let syncrate = crate::duration::parse(syncrate_raw)
            .map_err(|e| PackageError::Malformed(serde_json::Error::custom_like(e)))?;

        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .map(|s| match s {
                "ACTIVE" => PackageStatus::Active,
                "SYNC" => PackageStatus::Sync,
                "ERROR" => PackageStatus::Error,
                _ => PackageStatus::Unknown,
            })
            .unwrap_or_default();

        let link = obj
            .get("link")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| serde_json::from_value(v.clone()).ok()).collect())
            .unwrap_or_default();

        let settings_obj =
            obj.get("settings").and_then(Value::as_object).ok_or(PackageError::MissingField("settings"))?;
        let settings = PackageSettings::from_dict(settings_obj)?;

        let lastsync = obj.get("lastsync").and_then(Value::as_f64).unwrap_or(0.0);
        let errorcount = obj.get("errorcount").and_then(Value::as_u64).unwrap_or(0) as u32;
        let disabled = obj.get("disabled").and_then(Value::as_bool).unwrap_or(false);
        let timestamp = obj.get("timestamp").and_then(Value::as_u64).unwrap_or(0);

        Ok(Package {
            pkgid: PackageId::new(pkgid),
            name: name.to_string(),
            status,
            href: href.to_string(),
            synctype: synctype.to_string(),
            syncrate,
            link,
            settings,
            lastsync,
            errorcount,
            disabled,
            timestamp,
        })
    }

    /// Serialize back to the declarative config/stat-file shape. Declarative
    /// (non-runtime) fields round-trip through `from_dict` ∘ `to_dict`
    /// (`spec.md` §8).
    pub fn to_dict(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.pkgid.0.clone()));
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("status".to_string(), Value::String(self.status.to_string()));
        map.insert("href".to_string(), Value::String(self.href.clone()));
        map.insert("synctype".to_string(), Value::String(self.synctype.clone()));
        map.insert(
            "syncrate".to_string(),
            Value::String(crate::duration::format(self.syncrate).unwrap_or_default()),
        );
        map.insert("link".to_string(), serde_json::to_value(&self.link).unwrap_or(Value::Array(vec![])));
        map.insert("settings".to_string(), Value::Object(self.settings.to_dict()));
        map.insert("lastsync".to_string(), serde_json::json!(self.lastsync));
        map.insert("errorcount".to_string(), serde_json::json!(self.errorcount));
        map.insert("disabled".to_string(), Value::Bool(self.disabled));
        map.insert("timestamp".to_string(), serde_json::json!(self.timestamp));
        Value::Object(map)
    }

    pub fn is_syncing(&self) -> bool {
        self.status == PackageStatus::Sync
    }

    pub fn is_push_only(&self) -> bool {
        self.syncrate == -1
    }

    /// Perform a guarded status transition per the table in `spec.md` §4.3.
    /// Updates `timestamp` and, on entry into `ERROR`, increments
    /// `errorcount` (P1). Callers are responsible for firing
    /// `PACKAGE_STATUS_UPDATE.PRE`/`.POST` around this call and for
    /// persisting the result — this method is pure state, no I/O.
    pub fn transition(&mut self, to: PackageStatus, now_ms: u64) -> Result<(), InvalidTransition> {
        use PackageStatus::*;
        let allowed = matches!(
            (self.status, to),
            (Unknown, Active) | (Unknown, Sync) | (Unknown, Error)
                | (Active, Sync) | (Active, Error)
                | (Sync, Active) | (Sync, Error)
                | (Error, Active) | (Error, Sync) | (Error, Error)
        );
        if !allowed {
            return Err(InvalidTransition { from: self.status, to });
        }
        self.status = to;
        self.timestamp = now_ms;
        if to == Error {
            self.errorcount += 1;
        }
        Ok(())
    }

    /// The reload-only `ACTIVE -> UNKNOWN` path (and the general "seed a
    /// previously-unknown package" path) bypasses [`Package::transition`]
    /// deliberately: it isn't triggered by a scheduler/notification event.
    pub fn reset_to_unknown(&mut self, now_ms: u64) {
        self.status = PackageStatus::Unknown;
        self.timestamp = now_ms;
    }
}

// serde_json::Error has no public constructor from an arbitrary std::error::Error,
// so route parse failures through `Error::custom`-compatible machinery via serde::de::Error.
trait ErrorExt {
    fn custom_like<E: std::fmt::Display>(e: E) -> Self;
}

impl ErrorExt for serde_json::Error {
    fn custom_like<E: std::fmt::Display>(e: E) -> Self {
        serde::de::Error::custom(e.to_string())
    }
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;
