// SPDX-License-Identifier: MIT

//! `ping` / `status` / `list-packages` / `get-package` / `start-sync` /
//! `stop-sync` — admin RPCs against the master control socket (`spec.md`
//! §6).

use mirrord_core::PackageId;
use mirrord_wire::PackageSummary;
use std::path::Path;

use crate::client::AdminClient;
use crate::color;
use crate::error::CliError;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

async fn connect(config: &Path) -> Result<AdminClient, CliError> {
    let settings = mirrord_storage::load_settings(config)?;
    AdminClient::connect(&settings.master_socket, APP_VERSION).await
}

pub async fn ping(config: &Path) -> Result<(), CliError> {
    connect(config).await?.ping().await?;
    println!("pong");
    Ok(())
}

pub async fn status(config: &Path) -> Result<(), CliError> {
    let info = connect(config).await?.status().await?;
    println!("{}: {}", color::header("role"), info.role);
    println!("{}: {}", color::header("running"), info.running);
    println!("{}: {}", color::header("version"), info.version);
    println!("{}: {}", color::header("socket"), info.socket);
    Ok(())
}

pub async fn list_packages(config: &Path) -> Result<(), CliError> {
    let packages = connect(config).await?.list_packages().await?;
    if packages.is_empty() {
        println!("No packages configured.");
        return Ok(());
    }
    for pkg in &packages {
        print_package_line(&pkg);
    }
    Ok(())
}

pub async fn get_package(config: &Path, package_id: &str) -> Result<(), CliError> {
    let pkg = connect(config).await?.get_package(PackageId::new(package_id)).await?;
    println!("{}: {}", color::header("pkgid"), pkg.pkgid);
    println!("{}: {}", color::header("name"), pkg.name);
    println!("{}: {}", color::header("status"), pkg.status);
    println!("{}: {}", color::header("synctype"), pkg.synctype);
    println!("{}: {}", color::header("syncrate"), pkg.syncrate);
    println!("{}: {}", color::header("lastsync"), pkg.lastsync);
    println!("{}: {}", color::header("errorcount"), pkg.errorcount);
    println!("{}: {}", color::header("disabled"), pkg.disabled);
    println!("{}: {}", color::header("href"), pkg.href);
    Ok(())
}

pub async fn start_sync(config: &Path, package_id: &str) -> Result<(), CliError> {
    connect(config).await?.start_sync(PackageId::new(package_id)).await?;
    println!("{} queued for resync", color::header(package_id));
    Ok(())
}

pub async fn stop_sync(config: &Path, package_id: &str) -> Result<(), CliError> {
    connect(config).await?.stop_sync(PackageId::new(package_id)).await?;
    println!("{} sync stopped", color::header(package_id));
    Ok(())
}

fn print_package_line(pkg: &PackageSummary) {
    let disabled = if pkg.disabled { color::muted(" (disabled)") } else { String::new() };
    println!(
        "{:<16} {:<10} {:<8} every {}{}",
        color::header(&pkg.pkgid.0),
        pkg.status,
        pkg.synctype,
        pkg.syncrate,
        disabled
    );
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
