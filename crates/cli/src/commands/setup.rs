// SPDX-License-Identifier: MIT

//! `setup` — one-shot root bootstrap: default config file, runtime
//! directories, and systemd unit files (`spec.md` §6; grounded on the
//! source's `mirror.command.setup.setup`).

use std::path::Path;

use crate::error::CliError;

const ETC_DIR: &str = "/etc/mirrord";
const RUN_DIR: &str = "/var/run/mirrord";
const LIB_DIR: &str = "/var/lib/mirrord";
const SYSTEMD_DIR: &str = "/etc/systemd/system";

pub fn run() -> Result<(), CliError> {
    if !cfg!(target_os = "linux") {
        return Err(CliError::UnsupportedPlatform);
    }
    if !nix::unistd::geteuid().is_root() {
        return Err(CliError::NotRoot);
    }

    std::fs::create_dir_all(ETC_DIR)?;
    std::fs::create_dir_all(RUN_DIR)?;
    std::fs::create_dir_all(LIB_DIR)?;

    let config_path = Path::new(ETC_DIR).join("config.json");
    mirrord_storage::atomic_write(&config_path, default_config().to_string().as_bytes())?;

    std::fs::create_dir_all(SYSTEMD_DIR)?;
    std::fs::write(Path::new(SYSTEMD_DIR).join("mirrord.service"), master_unit())?;
    std::fs::write(Path::new(SYSTEMD_DIR).join("mirrord-worker.service"), worker_unit())?;

    Ok(())
}

fn default_config() -> serde_json::Value {
    serde_json::json!({
        "mirrorname": "My Mirror",
        "hostname": "",
        "settings": {
            "statfile": format!("{LIB_DIR}/stat.json"),
            "statusfile": format!("{LIB_DIR}/status.json"),
            "logfolder": "/var/log/mirrord",
            "webroot": "/var/www/mirrord",
            "uid": 1000,
            "gid": 1000,
            "localtimezone": "UTC",
            "master_socket": format!("{RUN_DIR}/master.sock"),
            "worker_socket": format!("{RUN_DIR}/worker.sock"),
        },
        "packages": {},
    })
}

fn master_unit() -> String {
    format!(
        "[Unit]\n\
         Description=Mirror sync master\n\
         After=network.target\n\
         \n\
         [Service]\n\
         ExecStart=/usr/bin/mirrord-master {ETC_DIR}/config.json\n\
         Restart=always\n\
         User=root\n\
         Group=root\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n"
    )
}

fn worker_unit() -> String {
    format!(
        "[Unit]\n\
         Description=Mirror sync worker\n\
         After=network.target\n\
         \n\
         [Service]\n\
         ExecStart=/usr/bin/mirrord-worker --config {ETC_DIR}/config.json\n\
         Restart=always\n\
         User=root\n\
         Group=root\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n"
    )
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
