// SPDX-License-Identifier: MIT

//! Top-level error aggregation (`spec.md` §7). Each boundary returns its own
//! specific error enum; this type exists for callers (CLI exit-code mapping,
//! top-level `main` error reporting) that want one `Result` alias to bubble
//! any of them through `?`.

use crate::config::ConfigError;
use crate::package::PackageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrordError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("{0}")]
    Other(String),
}
