// SPDX-License-Identifier: MIT

//! Top-level error aggregate for the worker binary (`spec.md` §7).

use mirrord_core::ConfigError;
use mirrord_storage::StorageError;
use mirrord_wire::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("job {0:?} already exists")]
    JobAlreadyExists(String),

    #[error("job {0:?} not found")]
    JobNotFound(String),

    #[error("failed to spawn job: {0}")]
    Spawn(std::io::Error),

    #[error("another worker instance is already running on {0}")]
    AlreadyRunning(std::path::PathBuf),
}
