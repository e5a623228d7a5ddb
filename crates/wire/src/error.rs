// SPDX-License-Identifier: MIT

//! Errors at the IPC boundary (`spec.md` §7: `IPCError`, `ProtocolVersionMismatch`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed before a full message was read")]
    ConnectionClosed,

    #[error("message body length {len} exceeds the maximum frame size")]
    MessageTooLarge { len: u32 },

    #[error("zero-byte message body")]
    EmptyBody,

    #[error("handshake timed out after 5s")]
    HandshakeTimeout,

    #[error("app name mismatch: expected {expected:?}, got {got:?}")]
    AppMismatch { expected: String, got: String },

    #[error("protocol version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("peer closed the handshake: status {status} {message}")]
    HandshakeRejected { status: u16, message: String },

    #[error("fd-passing error: {0}")]
    FdPass(#[from] nix::Error),
}
