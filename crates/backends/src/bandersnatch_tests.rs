use super::*;
use crate::dispatch::fake::FakeWorkerDispatch;
use mirrord_core::{PackageId, PackageSettings, PackageStatus};
use serde_json::Map;
use std::path::PathBuf;

fn package() -> Package {
    Package {
        pkgid: PackageId::new("pypi"),
        name: "PyPI".to_string(),
        status: PackageStatus::Unknown,
        href: "/pypi/".to_string(),
        synctype: "bandersnatch".to_string(),
        syncrate: 3600,
        link: vec![],
        settings: PackageSettings {
            hidden: false,
            src: "https://pypi.org".to_string(),
            dst: "/data/pypi".to_string(),
            options: Map::new(),
        },
        lastsync: 0.0,
        errorcount: 0,
        disabled: false,
        timestamp: 0,
    }
}

#[tokio::test]
async fn dispatch_never_resolves_to_active_directly() {
    let pkg = package();
    let fake = FakeWorkerDispatch::new();
    let logfolder = PathBuf::from("/var/log/mirrord");
    let ctx = BackendContext::new(&fake, 0, 0, &logfolder, "Example Mirror");

    let outcome = BandersnatchBackend::new().execute(&pkg, &ctx).await.expect("execute should succeed");
    // Only Dispatched is reachable; ACTIVE comes solely from job_finished.
    assert_eq!(outcome, DispatchOutcome::Dispatched);
    assert_eq!(fake.calls()[0].commandline, vec!["bandersnatch".to_string(), "mirror".to_string()]);
}

#[tokio::test]
async fn dispatch_failure_propagates_as_backend_error() {
    let pkg = package();
    let fake = FakeWorkerDispatch::failing();
    let logfolder = PathBuf::from("/var/log/mirrord");
    let ctx = BackendContext::new(&fake, 0, 0, &logfolder, "Example Mirror");

    let err = BandersnatchBackend::new().execute(&pkg, &ctx).await.unwrap_err();
    assert!(matches!(err, BackendError::Dispatch(_)));
}
