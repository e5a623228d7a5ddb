use super::*;
use crate::dispatch::fake::FakeWorkerDispatch;
use mirrord_core::{PackageId, PackageSettings, PackageStatus};
use serde_json::{json, Map};
use std::path::PathBuf;

fn package(options: Map<String, serde_json::Value>) -> Package {
    Package {
        pkgid: PackageId::new("archlinux"),
        name: "Arch Linux".to_string(),
        status: PackageStatus::Unknown,
        href: "/archlinux/".to_string(),
        synctype: "ftpsync".to_string(),
        syncrate: 3600,
        link: vec![],
        settings: PackageSettings {
            hidden: false,
            src: "rsync.archlinux.org::ftp".to_string(),
            dst: "/data/archlinux".to_string(),
            options,
        },
        lastsync: 0.0,
        errorcount: 0,
        disabled: false,
        timestamp: 0,
    }
}

#[tokio::test]
async fn dispatches_with_mirrorname_and_credentials_in_env() {
    let mut opts = Map::new();
    opts.insert("user".to_string(), json!("mirroruser"));
    opts.insert("password".to_string(), json!("hunter2"));
    let pkg = package(opts);
    let fake = FakeWorkerDispatch::new();
    let logfolder = PathBuf::from("/var/log/mirrord");
    let ctx = BackendContext::new(&fake, 0, 0, &logfolder, "Example Mirror");

    let outcome = FtpsyncBackend::new().execute(&pkg, &ctx).await.expect("execute should succeed");
    assert_eq!(outcome, DispatchOutcome::Dispatched);

    let env = FtpsyncBackend::build_env(&pkg, "Example Mirror", &logfolder);
    assert_eq!(env.get("MIRRORNAME"), Some(&"Example Mirror".to_string()));
    assert_eq!(env.get("TO"), Some(&"/data/archlinux".to_string()));
    assert_eq!(env.get("RSYNC_USER"), Some(&"mirroruser".to_string()));
    assert_eq!(env.get("RSYNC_PASSWORD"), Some(&"hunter2".to_string()));
}

#[tokio::test]
async fn omits_credential_vars_when_not_configured() {
    let pkg = package(Map::new());
    let logfolder = PathBuf::from("/var/log/mirrord");
    let env = FtpsyncBackend::build_env(&pkg, "Example Mirror", &logfolder);
    assert!(!env.contains_key("RSYNC_USER"));
    assert!(!env.contains_key("RSYNC_PASSWORD"));
}

#[tokio::test]
async fn info_and_arch_fields_use_the_script_s_prefixed_variable_names() {
    let mut opts = Map::new();
    opts.insert("path".to_string(), json!("/pub/archlinux"));
    opts.insert("maintainer".to_string(), json!("mirror-team@example.org"));
    opts.insert("sponsor".to_string(), json!("Example Sponsor"));
    opts.insert("country".to_string(), json!("DE"));
    opts.insert("location".to_string(), json!("Berlin"));
    opts.insert("throughput".to_string(), json!("1000"));
    opts.insert("arch_include".to_string(), json!("x86_64"));
    opts.insert("arch_exclude".to_string(), json!("i686"));
    let pkg = package(opts);
    let logfolder = PathBuf::from("/var/log/mirrord");

    let env = FtpsyncBackend::build_env(&pkg, "Example Mirror", &logfolder);
    assert_eq!(env.get("RSYNC_PATH"), Some(&"/pub/archlinux".to_string()));
    assert_eq!(env.get("INFO_MAINTAINER"), Some(&"mirror-team@example.org".to_string()));
    assert_eq!(env.get("INFO_SPONSOR"), Some(&"Example Sponsor".to_string()));
    assert_eq!(env.get("INFO_COUNTRY"), Some(&"DE".to_string()));
    assert_eq!(env.get("INFO_LOCATION"), Some(&"Berlin".to_string()));
    assert_eq!(env.get("INFO_THROUGHPUT"), Some(&"1000".to_string()));
    assert_eq!(env.get("ARCH_INCLUDE"), Some(&"x86_64".to_string()));
    assert_eq!(env.get("ARCH_EXCLUDE"), Some(&"i686".to_string()));
    assert!(!env.contains_key("PATH"));
    assert!(!env.contains_key("MAINTAINER"));
}

#[tokio::test]
async fn logdir_defaults_to_the_daemon_logfolder() {
    let pkg = package(Map::new());
    let logfolder = PathBuf::from("/var/log/mirrord");
    let env = FtpsyncBackend::build_env(&pkg, "Example Mirror", &logfolder);
    assert_eq!(env.get("LOGDIR"), Some(&"/var/log/mirrord".to_string()));
}
