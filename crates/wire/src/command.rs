// SPDX-License-Identifier: MIT

//! Typed wrappers around the command set each control socket exposes
//! (`spec.md` §6). These are a convenience layer over [`crate::Request`]/
//! [`crate::Response`] — the wire itself carries only the untyped envelope.

use mirrord_core::{JobId, PackageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::request::Request;

/// Commands accepted on the master control socket.
#[derive(Debug, Clone, PartialEq)]
pub enum MasterCommand {
    Ping,
    Status,
    ListPackages,
    StartSync { package_id: PackageId },
    StopSync { package_id: PackageId },
    GetPackage { package_id: PackageId },
}

impl MasterCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Status => "status",
            Self::ListPackages => "list_packages",
            Self::StartSync { .. } => "start_sync",
            Self::StopSync { .. } => "stop_sync",
            Self::GetPackage { .. } => "get_package",
        }
    }

    pub fn into_request(self) -> Request {
        let kwargs = match &self {
            Self::Ping | Self::Status | Self::ListPackages => None,
            Self::StartSync { package_id } | Self::StopSync { package_id } => {
                Some(serde_json::json!({ "package_id": package_id.0 }))
            }
            Self::GetPackage { package_id } => Some(serde_json::json!({ "package_id": package_id.0 })),
        };
        match kwargs {
            Some(kwargs) => Request::with_kwargs(self.name(), kwargs),
            None => Request::new(self.name()),
        }
    }

    /// Reconstruct a command from a decoded [`Request`]. Used by the RPC
    /// server side to dispatch on `command` without re-parsing raw JSON in
    /// every handler.
    pub fn from_request(req: &Request) -> Option<Self> {
        let get_package_id = || -> Option<PackageId> {
            req.kwargs.as_ref()?.get("package_id")?.as_str().map(PackageId::new)
        };
        match req.command.as_str() {
            "ping" => Some(Self::Ping),
            "status" => Some(Self::Status),
            "list_packages" => Some(Self::ListPackages),
            "start_sync" => Some(Self::StartSync { package_id: get_package_id()? }),
            "stop_sync" => Some(Self::StopSync { package_id: get_package_id()? }),
            "get_package" => Some(Self::GetPackage { package_id: get_package_id()? }),
            _ => None,
        }
    }
}

/// Commands accepted on the worker control socket.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerCommand {
    Ping,
    Status,
    ExecuteCommand {
        job_id: JobId,
        commandline: Vec<String>,
        env: BTreeMap<String, String>,
        sync_method: String,
        uid: Option<u32>,
        gid: Option<u32>,
        nice: Option<i32>,
        log_path: Option<PathBuf>,
    },
    StopCommand {
        job_id: Option<JobId>,
    },
    GetProgress {
        job_id: Option<JobId>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExecuteCommandKwargs {
    job_id: String,
    commandline: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    sync_method: String,
    #[serde(default)]
    uid: Option<u32>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    nice: Option<i32>,
    #[serde(default)]
    log_path: Option<PathBuf>,
}

impl WorkerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Status => "status",
            Self::ExecuteCommand { .. } => "execute_command",
            Self::StopCommand { .. } => "stop_command",
            Self::GetProgress { .. } => "get_progress",
        }
    }

    pub fn into_request(self) -> Request {
        match self {
            Self::Ping => Request::new("ping"),
            Self::Status => Request::new("status"),
            Self::ExecuteCommand { job_id, commandline, env, sync_method, uid, gid, nice, log_path } => {
                let kwargs = ExecuteCommandKwargs {
                    job_id: job_id.0,
                    commandline,
                    env,
                    sync_method,
                    uid,
                    gid,
                    nice,
                    log_path,
                };
                Request::with_kwargs(
                    "execute_command",
                    serde_json::to_value(kwargs).unwrap_or(Value::Null),
                )
            }
            Self::StopCommand { job_id } => match job_id {
                Some(id) => Request::with_kwargs("stop_command", serde_json::json!({ "job_id": id.0 })),
                None => Request::new("stop_command"),
            },
            Self::GetProgress { job_id } => match job_id {
                Some(id) => Request::with_kwargs("get_progress", serde_json::json!({ "job_id": id.0 })),
                None => Request::new("get_progress"),
            },
        }
    }

    pub fn from_request(req: &Request) -> Option<Self> {
        match req.command.as_str() {
            "ping" => Some(Self::Ping),
            "status" => Some(Self::Status),
            "execute_command" => {
                let kwargs: ExecuteCommandKwargs =
                    serde_json::from_value(req.kwargs.clone()?).ok()?;
                Some(Self::ExecuteCommand {
                    job_id: JobId::new(kwargs.job_id),
                    commandline: kwargs.commandline,
                    env: kwargs.env,
                    sync_method: kwargs.sync_method,
                    uid: kwargs.uid,
                    gid: kwargs.gid,
                    nice: kwargs.nice,
                    log_path: kwargs.log_path,
                })
            }
            "stop_command" => {
                let job_id = req
                    .kwargs
                    .as_ref()
                    .and_then(|v| v.get("job_id"))
                    .and_then(Value::as_str)
                    .map(JobId::new);
                Some(Self::StopCommand { job_id })
            }
            "get_progress" => {
                let job_id = req
                    .kwargs
                    .as_ref()
                    .and_then(|v| v.get("job_id"))
                    .and_then(Value::as_str)
                    .map(JobId::new);
                Some(Self::GetProgress { job_id })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
