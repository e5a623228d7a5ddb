use super::*;
use crate::dispatch::fake::FakeWorkerDispatch;
use mirrord_core::{PackageId, PackageSettings, PackageStatus};
use serde_json::{json, Map};
use std::path::PathBuf;

fn package(options: Map<String, serde_json::Value>) -> Package {
    Package {
        pkgid: PackageId::new("mirror"),
        name: "Mirror".to_string(),
        status: PackageStatus::Unknown,
        href: "/mirror/".to_string(),
        synctype: "rsync".to_string(),
        syncrate: 3600,
        link: vec![],
        settings: PackageSettings { hidden: false, src: "rsync://u/m".to_string(), dst: "/data/m".to_string(), options },
        lastsync: 0.0,
        errorcount: 0,
        disabled: false,
        timestamp: 0,
    }
}

#[tokio::test]
async fn dispatches_full_sync_when_ffts_disabled() {
    let pkg = package(Map::new());
    let fake = FakeWorkerDispatch::new();
    let logfolder = PathBuf::from("/var/log/mirrord");
    let ctx = BackendContext::new(&fake, 100, 100, &logfolder, "Example Mirror");

    let outcome = RsyncBackend::new().execute(&pkg, &ctx).await.expect("execute should succeed");
    assert_eq!(outcome, DispatchOutcome::Dispatched);

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].sync_method, "rsync");
    assert!(calls[0].commandline.contains(&"rsync://u/m".to_string()));
}

#[tokio::test]
async fn dispatches_full_sync_when_ffts_enabled_without_fftsfile() {
    let mut opts = Map::new();
    opts.insert("ffts".to_string(), json!(true));
    let pkg = package(opts);
    let fake = FakeWorkerDispatch::new();
    let logfolder = PathBuf::from("/var/log/mirrord");
    let ctx = BackendContext::new(&fake, 0, 0, &logfolder, "Example Mirror");

    let outcome = RsyncBackend::new().execute(&pkg, &ctx).await.expect("execute should succeed");
    assert_eq!(outcome, DispatchOutcome::Dispatched);
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn auth_options_become_rsync_env_vars() {
    let mut opts = Map::new();
    opts.insert("auth".to_string(), json!(true));
    opts.insert("user".to_string(), json!("mirror"));
    opts.insert("password".to_string(), json!("s3cret"));
    let pkg = package(opts);
    let fake = FakeWorkerDispatch::new();
    let logfolder = PathBuf::from("/var/log/mirrord");
    let ctx = BackendContext::new(&fake, 0, 0, &logfolder, "Example Mirror");

    RsyncBackend::new().execute(&pkg, &ctx).await.expect("execute should succeed");
    let env = RsyncBackend::auth_env(&pkg);
    assert_eq!(env.get("USER"), Some(&"mirror".to_string()));
    assert_eq!(env.get("RSYNC_PASSWORD"), Some(&"s3cret".to_string()));
}
