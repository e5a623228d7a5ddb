// SPDX-License-Identifier: MIT

//! `crontab -u <user> -c <config>` — emit one cron line per time-scheduled
//! package, translating `syncrate` into a `*/N * * * *` cadence that invokes
//! `mirrordctl start-sync` (`spec.md` §6; grounded on the source's
//! `mirror crontab` command, which is not itself in the retrieval pack).
//!
//! Push-only packages (`syncrate == -1`, the `PUSH` sentinel) are never due
//! by time and are skipped — they are triggered externally, not by cron.

use mirrord_backends::BackendRegistry;
use mirrord_core::Package;
use std::path::Path;

use crate::error::CliError;

pub async fn run(user: &str, config: &Path) -> Result<(), CliError> {
    let registry = BackendRegistry::with_default_backends();
    let (_config, packages) = mirrord_storage::load(config, &registry.names())?;

    let config_display = config.display().to_string();
    for pkg in packages.iter_in_order() {
        if let Some(line) = cron_line(user, &config_display, pkg) {
            println!("{line}");
        }
    }
    Ok(())
}

/// The cron line for one package, or `None` if it is disabled or push-only
/// (`syncrate == -1`) and therefore never due by time.
fn cron_line(user: &str, config_display: &str, pkg: &Package) -> Option<String> {
    if pkg.disabled || pkg.syncrate < 0 {
        return None;
    }
    let minutes = (pkg.syncrate / 60).max(1);
    Some(format!(
        "*/{minutes} * * * * {user} mirrordctl start-sync --config {config_display} {}",
        pkg.pkgid
    ))
}

#[cfg(test)]
#[path = "crontab_tests.rs"]
mod tests;
