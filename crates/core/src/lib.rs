// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mirrord-core: domain types shared by the master and worker processes of
//! the mirror synchronization daemon — packages, configuration, the small
//! event vocabulary, ID newtypes, the duration codec, and the `Clock`
//! abstraction used to make the scheduler loop testable.

pub mod macros;

pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod event;
pub mod id;
pub mod package;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError, FtpSyncDefaults, PackageTable};
pub use error::MirrordError;
pub use event::Event;
pub use id::{JobId, PackageId};
pub use package::{InvalidTransition, Link, Package, PackageError, PackageSettings, PackageStatus};
