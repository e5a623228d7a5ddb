// SPDX-License-Identifier: MIT

//! Top-level error aggregate for the master binary (`spec.md` §7).

use mirrord_backends::{BackendError, DispatchError};
use mirrord_core::{ConfigError, PackageError};
use mirrord_storage::StorageError;
use mirrord_wire::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MasterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("another master instance is already running on {0}")]
    AlreadyRunning(std::path::PathBuf),
}
