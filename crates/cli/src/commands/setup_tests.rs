use super::*;

#[test]
fn default_config_carries_the_expected_settings_paths() {
    let config = default_config();
    assert_eq!(config["settings"]["master_socket"], format!("{RUN_DIR}/master.sock"));
    assert_eq!(config["settings"]["worker_socket"], format!("{RUN_DIR}/worker.sock"));
    assert_eq!(config["settings"]["statfile"], format!("{LIB_DIR}/stat.json"));
    assert_eq!(config["packages"], serde_json::json!({}));
}

#[test]
fn master_unit_invokes_the_master_binary_with_the_default_config_path() {
    let unit = master_unit();
    assert!(unit.contains(&format!("ExecStart=/usr/bin/mirrord-master {ETC_DIR}/config.json")));
}

#[test]
fn worker_unit_invokes_the_worker_binary_with_the_default_config_path() {
    let unit = worker_unit();
    assert!(unit.contains(&format!("ExecStart=/usr/bin/mirrord-worker --config {ETC_DIR}/config.json")));
}

#[test]
fn run_refuses_to_proceed_without_root() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let err = run().unwrap_err();
    assert!(matches!(err, CliError::NotRoot));
}
