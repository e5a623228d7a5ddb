// SPDX-License-Identifier: MIT

//! A short-lived connection to the master control socket (`spec.md` §6).
//!
//! Unlike [`mirrord-master`]'s `WorkerClient`, this client never outlives a
//! single command invocation and the master never pushes unsolicited frames
//! on this socket, so one request/response round trip per call is enough —
//! no background reader task, no pending-request queue.

use mirrord_core::PackageId;
use mirrord_wire::{
    client_handshake, receive, send, MasterCommand, MasterStatusInfo, PackageSummary,
    ProtocolError, Response, Role, APP_NAME,
};
use std::path::Path;
use tokio::net::UnixStream;

use crate::error::CliError;

pub struct AdminClient {
    stream: UnixStream,
}

impl AdminClient {
    pub async fn connect(socket_path: &Path, app_version: &str) -> Result<Self, CliError> {
        let mut stream = UnixStream::connect(socket_path).await?;
        client_handshake(&mut stream, APP_NAME, app_version, Role::Client).await?;
        Ok(Self { stream })
    }

    async fn call(&mut self, command: MasterCommand) -> Result<Response, CliError> {
        send(&mut self.stream, &command.into_request()).await?;
        let response: Response = receive(&mut self.stream).await?;
        Ok(response)
    }

    pub async fn ping(&mut self) -> Result<(), CliError> {
        let response = self.call(MasterCommand::Ping).await?;
        require_success(response).map(|_| ())
    }

    pub async fn status(&mut self) -> Result<MasterStatusInfo, CliError> {
        let response = self.call(MasterCommand::Status).await?;
        decode_data(require_success(response)?)
    }

    pub async fn list_packages(&mut self) -> Result<Vec<PackageSummary>, CliError> {
        let response = self.call(MasterCommand::ListPackages).await?;
        let data = require_success(response)?;
        let packages = data.get("packages").cloned().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(packages).unwrap_or_default())
    }

    pub async fn get_package(&mut self, package_id: PackageId) -> Result<PackageSummary, CliError> {
        let response = self.call(MasterCommand::GetPackage { package_id }).await?;
        decode_data(require_success(response)?)
    }

    pub async fn start_sync(&mut self, package_id: PackageId) -> Result<(), CliError> {
        let response = self.call(MasterCommand::StartSync { package_id }).await?;
        require_success(response).map(|_| ())
    }

    pub async fn stop_sync(&mut self, package_id: PackageId) -> Result<(), CliError> {
        let response = self.call(MasterCommand::StopSync { package_id }).await?;
        require_success(response).map(|_| ())
    }
}

fn require_success(response: Response) -> Result<serde_json::Value, CliError> {
    if response.is_success() {
        Ok(response.data)
    } else if response.status == Response::NOT_FOUND {
        Err(CliError::UnknownPackage(response.message))
    } else {
        Err(CliError::Rejected { status: response.status, message: response.message })
    }
}

fn decode_data<T: serde::de::DeserializeOwned>(data: serde_json::Value) -> Result<T, CliError> {
    serde_json::from_value(data)
        .map_err(|err| CliError::Protocol(ProtocolError::Json(err)))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
