// SPDX-License-Identifier: MIT

//! `mirrordctl` command implementations.

pub mod admin;
pub mod crontab;
pub mod run;
pub mod setup;
