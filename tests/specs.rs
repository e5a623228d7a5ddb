// SPDX-License-Identifier: MIT

//! End-to-end scenarios (`spec.md` §8): the real `mirrord-master` scheduler
//! loop driven against a stand-in worker socket, matching the six literal
//! test-suite scenarios the specification pins.

mod support;

use mirrord_wire::{MasterCommand, PackageSummary, Response};
use std::time::Duration;
use support::{
    call_master, handshake_with_bad_protocol_version, now_secs, package_id, seed_stale_sync_stat,
    write_config, DispatchOutcome, FakeWorker,
};

async fn poll_until<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn clean_start_with_one_package_reaches_active() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &[("mirror", "")]);
    let worker = FakeWorker::start(dir.path().join("worker.sock"), DispatchOutcome::Succeed).await;

    let master_socket = dir.path().join("master.sock");
    let handle = tokio::spawn(async move { mirrord_master::run(&config).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let reached_active = poll_until(Duration::from_secs(5), || {
        let socket = master_socket.clone();
        Box::pin(async move {
            let Ok(response) = call_master(&socket, MasterCommand::GetPackage { package_id: package_id("mirror") }).await else {
                return false;
            };
            let Ok(summary) = serde_json::from_value::<PackageSummary>(response.data) else {
                return false;
            };
            summary.status == "ACTIVE" && summary.lastsync > 0.0
        })
    })
    .await;

    assert!(reached_active, "package should reach ACTIVE after the worker reports success");
    assert!(worker.execute_count() >= 1);
    handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_increments_errorcount_once_per_retry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &[("mirror", "")]);
    let worker = FakeWorker::start(dir.path().join("worker.sock"), DispatchOutcome::Fail).await;
    let master_socket = dir.path().join("master.sock");

    let handle = tokio::spawn(async move { mirrord_master::run(&config).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let first_error = poll_until(Duration::from_secs(5), || {
        let socket = master_socket.clone();
        Box::pin(async move {
            let Ok(response) = call_master(&socket, MasterCommand::GetPackage { package_id: package_id("mirror") }).await else {
                return false;
            };
            let Ok(summary) = serde_json::from_value::<PackageSummary>(response.data) else {
                return false;
            };
            summary.status == "ERROR" && summary.errorcount == 1
        })
    })
    .await;
    assert!(first_error, "first dispatch failure should set ERROR with errorcount=1");

    // `lastsync` is left untouched by a failed dispatch, so the package stays
    // due every tick regardless of `errorcontinuetime`; it fails and
    // re-increments `errorcount` on the very next tick.
    let second_error = poll_until(Duration::from_secs(6), || {
        let socket = master_socket.clone();
        Box::pin(async move {
            let Ok(response) = call_master(&socket, MasterCommand::GetPackage { package_id: package_id("mirror") }).await else {
                return false;
            };
            let Ok(summary) = serde_json::from_value::<PackageSummary>(response.data) else {
                return false;
            };
            summary.errorcount >= 2
        })
    })
    .await;
    assert!(second_error, "errorcount should advance past 1 after the retry window elapses");
    assert!(worker.execute_count() >= 2);
    handle.abort();
}

#[tokio::test]
async fn orphan_cleanup_drops_stat_entries_absent_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &[("mirror", "PT1H")]);

    let stat = serde_json::json!({
        "mirror": {"status": "ACTIVE", "statusinfo": {"errorcount": 0, "lastsync": 100.0, "timestamp": 0}},
        "legacy": {"status": "ACTIVE", "statusinfo": {"errorcount": 0, "lastsync": 100.0, "timestamp": 0}},
    });
    std::fs::write(dir.path().join("stat.json"), serde_json::to_vec_pretty(&stat).expect("serialize"))
        .expect("write stat");

    let registry = mirrord_backends::BackendRegistry::with_default_backends();
    let (_config, packages) = mirrord_storage::load(&config, &registry.names()).expect("load");
    assert!(packages.get(&package_id("mirror")).is_some());
    assert!(packages.get(&package_id("legacy")).is_none());

    let rewritten: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("stat.json")).expect("read stat"))
            .expect("parse rewritten stat");
    assert!(rewritten.get("legacy").is_none(), "orphan should be dropped from the rewritten stat file");
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_sync_is_swept_to_error_when_no_live_job_is_observed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &[("mirror", "PT1H")]);
    seed_stale_sync_stat(dir.path(), "mirror", now_secs() - 120.0);

    let worker = FakeWorker::start(dir.path().join("worker.sock"), DispatchOutcome::Succeed).await;
    worker.set_active_jobs(&[]);
    let master_socket = dir.path().join("master.sock");

    let handle = tokio::spawn(async move { mirrord_master::run(&config).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let swept = poll_until(Duration::from_secs(5), || {
        let socket = master_socket.clone();
        Box::pin(async move {
            let Ok(response) = call_master(&socket, MasterCommand::GetPackage { package_id: package_id("mirror") }).await else {
                return false;
            };
            let Ok(summary) = serde_json::from_value::<PackageSummary>(response.data) else {
                return false;
            };
            summary.status == "ERROR"
        })
    })
    .await;
    assert!(swept, "a SYNC package with no observed live job should sweep to ERROR after the grace window");
    handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn handshake_mismatch_is_rejected_with_protocol_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &[("mirror", "PUSH")]);
    let _worker = FakeWorker::start(dir.path().join("worker.sock"), DispatchOutcome::Succeed).await;
    let master_socket = dir.path().join("master.sock");

    let handle = tokio::spawn(async move { mirrord_master::run(&config).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = handshake_with_bad_protocol_version(&master_socket).await;
    assert_eq!(response.status, Response::PROTOCOL_MISMATCH);
    handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_admin_start_sync_does_not_double_dispatch_within_a_tick() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &[("mirror", "PT1H")]);
    let worker = FakeWorker::start(dir.path().join("worker.sock"), DispatchOutcome::Succeed).await;
    let master_socket = dir.path().join("master.sock");

    let handle = tokio::spawn(async move { mirrord_master::run(&config).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Package is due immediately (fresh UNKNOWN, syncrate 1h); let the first
    // natural tick dispatch and settle to ACTIVE before forcing a second.
    poll_until(Duration::from_secs(5), || {
        let socket = master_socket.clone();
        Box::pin(async move {
            let Ok(response) = call_master(&socket, MasterCommand::GetPackage { package_id: package_id("mirror") }).await else {
                return false;
            };
            let Ok(summary) = serde_json::from_value::<PackageSummary>(response.data) else {
                return false;
            };
            summary.status == "ACTIVE"
        })
    })
    .await;
    let count_before = worker.execute_count();

    let response = call_master(&master_socket, MasterCommand::StartSync { package_id: package_id("mirror") })
        .await
        .expect("start_sync call");
    assert!(response.is_success());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    // At most one extra dispatch should have happened for the forced resync,
    // never two within the same tick (P8).
    assert_eq!(worker.execute_count(), count_before + 1);
    handle.abort();
}
