use super::*;
use crate::dispatch::fake::FakeWorkerDispatch;
use mirrord_core::{PackageId, PackageSettings, PackageStatus};
use serde_json::Map;
use std::path::PathBuf;

fn package() -> Package {
    Package {
        pkgid: PackageId::new("scratch"),
        name: "Scratch Mirror".to_string(),
        status: PackageStatus::Unknown,
        href: "/scratch/".to_string(),
        synctype: "local".to_string(),
        syncrate: 3600,
        link: vec![],
        settings: PackageSettings {
            hidden: false,
            src: "/srv/upstream/scratch".to_string(),
            dst: "/data/scratch".to_string(),
            options: Map::new(),
        },
        lastsync: 0.0,
        errorcount: 0,
        disabled: false,
        timestamp: 0,
    }
}

#[tokio::test]
async fn dispatches_a_local_rsync_copy() {
    let pkg = package();
    let fake = FakeWorkerDispatch::new();
    let logfolder = PathBuf::from("/var/log/mirrord");
    let ctx = BackendContext::new(&fake, 0, 0, &logfolder, "Example Mirror");

    let outcome = LocalBackend::new().execute(&pkg, &ctx).await.expect("execute should succeed");
    assert_eq!(outcome, DispatchOutcome::Dispatched);

    let calls = fake.calls();
    assert_eq!(calls[0].sync_method, "local");
    assert!(calls[0].commandline.contains(&"/srv/upstream/scratch".to_string()));
    assert!(calls[0].commandline.contains(&"/data/scratch".to_string()));
}
