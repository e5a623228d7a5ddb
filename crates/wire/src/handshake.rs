// SPDX-License-Identifier: MIT

//! Capability handshake (`spec.md` §4.2).
//!
//! On connection accept the server sends its handshake frame first, then the
//! client sends its own. Each side validates the peer's `app_name` and
//! `protocol_version` against its own; on mismatch the detecting side closes
//! the connection (the server additionally replies with `403`/`400` before
//! closing, since it is in a position to). The whole exchange has a 5-second
//! wall-clock budget (P5).

use crate::error::ProtocolError;
use crate::framing::{receive, send};
use crate::response::Response;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

pub const PROTOCOL_VERSION: u32 = 1;
/// The `app_name` every master/worker/client connection identifies itself
/// with. Shared here so all three binaries agree on the same literal.
pub const APP_NAME: &str = "mirrord";
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Master,
    Worker,
    Client,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeInfo {
    pub app_name: String,
    pub app_version: String,
    pub protocol_version: u32,
    pub is_server: bool,
    pub role: Role,
}

impl HandshakeInfo {
    pub fn server(app_name: impl Into<String>, app_version: impl Into<String>, role: Role) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            protocol_version: PROTOCOL_VERSION,
            is_server: true,
            role,
        }
    }

    pub fn client(app_name: impl Into<String>, app_version: impl Into<String>, role: Role) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            protocol_version: PROTOCOL_VERSION,
            is_server: false,
            role,
        }
    }

    fn validate(&self, expected_app_name: &str) -> Result<(), ProtocolError> {
        if self.app_name != expected_app_name {
            return Err(ProtocolError::AppMismatch {
                expected: expected_app_name.to_string(),
                got: self.app_name.clone(),
            });
        }
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                got: self.protocol_version,
            });
        }
        Ok(())
    }
}

/// Server side of the handshake: send first, validate the client's reply,
/// and respond with the documented status code.
pub async fn server_handshake<S>(
    stream: &mut S,
    app_name: &str,
    app_version: &str,
    role: Role,
) -> Result<HandshakeInfo, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
        send(stream, &HandshakeInfo::server(app_name, app_version, role)).await?;
        let peer: HandshakeInfo = receive(stream).await?;

        match peer.validate(app_name) {
            Ok(()) => {
                send(stream, &Response::ok(serde_json::Value::Null)).await?;
                Ok(peer)
            }
            Err(ProtocolError::AppMismatch { expected, got }) => {
                let resp = Response::app_mismatch(format!(
                    "app name mismatch: expected {expected:?}, got {got:?}"
                ));
                send(stream, &resp).await?;
                Err(ProtocolError::AppMismatch { expected, got })
            }
            Err(ProtocolError::VersionMismatch { expected, got }) => {
                let resp = Response::protocol_mismatch(format!(
                    "protocol version mismatch: expected {expected}, got {got}"
                ));
                send(stream, &resp).await?;
                Err(ProtocolError::VersionMismatch { expected, got })
            }
            Err(other) => Err(other),
        }
    })
    .await
    .map_err(|_| ProtocolError::HandshakeTimeout)?
}

/// Client side of the handshake: validate the server's frame, send our own,
/// and wait for the server's status response.
pub async fn client_handshake<S>(
    stream: &mut S,
    app_name: &str,
    app_version: &str,
    role: Role,
) -> Result<HandshakeInfo, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
        let peer: HandshakeInfo = receive(stream).await?;
        peer.validate(app_name)?;

        send(stream, &HandshakeInfo::client(app_name, app_version, role)).await?;
        let resp: Response = receive(stream).await?;
        if resp.is_success() {
            Ok(peer)
        } else {
            Err(ProtocolError::HandshakeRejected { status: resp.status, message: resp.message })
        }
    })
    .await
    .map_err(|_| ProtocolError::HandshakeTimeout)?
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
