// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! IPC wire protocol for daemon communication (`spec.md` §4.1, §4.2, §6).
//!
//! Wire format: 4-byte big-endian length prefix + UTF-8 JSON payload.

mod command;
mod dto;
mod error;
mod fdpass;
mod framing;
mod handshake;
mod notification;
mod request;
mod response;

pub use command::{MasterCommand, WorkerCommand};
pub use dto::{JobProgressInfo, JobStartedInfo, MasterStatusInfo, PackageSummary, WorkerStatusInfo};
pub use error::ProtocolError;
pub use fdpass::{recv_fds, send_fds};
pub use framing::{decode, encode, read_message, receive, send, write_message, MAX_MESSAGE_LEN};
pub use handshake::{client_handshake, server_handshake, HandshakeInfo, Role, APP_NAME, PROTOCOL_VERSION};
pub use notification::{Notification, NotificationEvent, NotificationKind};
pub use request::Request;
pub use response::Response;
