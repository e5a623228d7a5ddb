// SPDX-License-Identifier: MIT

//! Top-level error aggregate for the `mirrordctl` binary (`spec.md` §7).

use mirrord_core::ConfigError;
use mirrord_storage::StorageError;
use mirrord_wire::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("master rejected the request: {message} (status {status})")]
    Rejected { status: u16, message: String },

    #[error("unknown package {0:?}")]
    UnknownPackage(String),

    #[error("{binary} exited with {status}")]
    ChildExited { binary: &'static str, status: std::process::ExitStatus },

    #[error("could not locate the {0} binary alongside mirrordctl or on PATH")]
    BinaryNotFound(&'static str),

    #[error("this command must be run as root")]
    NotRoot,

    #[error("this command only runs on Linux")]
    UnsupportedPlatform,
}
