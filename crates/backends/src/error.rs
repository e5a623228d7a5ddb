// SPDX-License-Identifier: MIT

//! Errors raised while a backend gathers options, runs a freshness probe,
//! or hands a command to the worker (`spec.md` §4.6).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("missing required option {0:?} in package.settings.options")]
    MissingOption(&'static str),

    #[error("invalid value for option {0:?}")]
    InvalidOption(&'static str),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Protocol(#[from] mirrord_wire::ProtocolError),

    #[error("worker rejected execute_command ({status}): {message}")]
    Rejected { status: u16, message: String },
}
