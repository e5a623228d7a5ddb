// SPDX-License-Identifier: MIT

//! Master control socket RPC server (`spec.md` §6).
//!
//! One accept loop, one handler task per accepted connection — short-lived
//! admin RPCs, distinct from the single persistent connection the scheduler
//! holds to the worker. `start_sync`/`stop_sync` are "admin overrides": they
//! nudge data the scheduler already reads (`lastsync`, the worker's live-job
//! set) rather than writing `Package.status` directly, so the scheduler loop
//! stays the only writer of status (`spec.md` §5).

use crate::state::SharedState;
use crate::worker_client::WorkerClient;
use mirrord_wire::{
    receive, send, server_handshake, MasterCommand, MasterStatusInfo, PackageSummary, ProtocolError,
    Request, Response, Role, APP_NAME,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};

pub struct MasterRpc {
    state: SharedState,
    worker: Arc<WorkerClient>,
    app_version: String,
    socket_path: PathBuf,
}

impl MasterRpc {
    pub fn new(
        state: SharedState,
        worker: Arc<WorkerClient>,
        app_version: String,
        socket_path: PathBuf,
    ) -> Self {
        Self { state, worker, app_version, socket_path }
    }

    /// Accept connections until the listener errors or the process is asked
    /// to shut down (the caller drops the listener / cancels this future).
    pub async fn serve(self: Arc<Self>, listener: UnixListener) {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::error!(error = %err, "master rpc accept failed");
                    continue;
                }
            };
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = this.handle_connection(stream).await {
                    tracing::debug!(error = %err, "master rpc connection ended");
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: UnixStream) -> Result<(), ProtocolError> {
        server_handshake(&mut stream, APP_NAME, &self.app_version, Role::Master).await?;
        loop {
            let request: Request = match receive(&mut stream).await {
                Ok(req) => req,
                Err(ProtocolError::ConnectionClosed) => return Ok(()),
                Err(err) => return Err(err),
            };
            let response = self.handle_request(&request).await;
            send(&mut stream, &response).await?;
        }
    }

    async fn handle_request(&self, request: &Request) -> Response {
        let Some(command) = MasterCommand::from_request(request) else {
            return Response::not_found(format!("unknown command {:?}", request.command));
        };

        match command {
            MasterCommand::Ping => Response::ok(serde_json::json!({ "message": "pong" })),
            MasterCommand::Status => Response::ok(self.status_payload()),
            MasterCommand::ListPackages => Response::ok(self.list_packages_payload()),
            MasterCommand::GetPackage { package_id } => {
                let state = self.state.lock();
                match state.packages.get(&package_id) {
                    Some(pkg) => {
                        serde_json::to_value(PackageSummary::from(pkg)).map(Response::ok).unwrap_or_else(
                            |err| Response::handler_error(format!("failed to encode package: {err}"), None),
                        )
                    }
                    None => Response::not_found(format!("unknown package {package_id:?}")),
                }
            }
            MasterCommand::StartSync { package_id } => self.start_sync(&package_id),
            MasterCommand::StopSync { package_id } => self.stop_sync(&package_id).await,
        }
    }

    fn status_payload(&self) -> Value {
        let info = MasterStatusInfo {
            running: true,
            role: "master".to_string(),
            version: self.app_version.clone(),
            socket: self.socket_path.display().to_string(),
        };
        serde_json::to_value(info).unwrap_or(Value::Null)
    }

    fn list_packages_payload(&self) -> Value {
        let state = self.state.lock();
        let packages: Vec<PackageSummary> = state.packages.iter_in_order().map(PackageSummary::from).collect();
        serde_json::json!({ "packages": packages })
    }

    fn start_sync(&self, package_id: &mirrord_core::PackageId) -> Response {
        let mut state = self.state.lock();
        match state.packages.get_mut(package_id) {
            Some(pkg) if pkg.disabled => {
                Response::handler_error(format!("package {package_id:?} is disabled"), None)
            }
            Some(pkg) => {
                pkg.lastsync = 0.0;
                Response::ok(serde_json::json!({ "package_id": package_id.0 }))
            }
            None => Response::not_found(format!("unknown package {package_id:?}")),
        }
    }

    async fn stop_sync(&self, package_id: &mirrord_core::PackageId) -> Response {
        {
            let state = self.state.lock();
            if state.packages.get(package_id).is_none() {
                return Response::not_found(format!("unknown package {package_id:?}"));
            }
        }
        let job_id = mirrord_core::JobId::new(package_id.0.clone());
        match self.worker.stop_command(Some(job_id)).await {
            Ok(()) => Response::ok(serde_json::json!({ "package_id": package_id.0 })),
            Err(err) => Response::handler_error(format!("failed to stop job: {err}"), None),
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
