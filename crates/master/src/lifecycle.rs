// SPDX-License-Identifier: MIT

//! Startup, the tick-driven scheduler runner, notification handling, and
//! graceful shutdown (`spec.md` §4.4, §5, §6).

use crate::error::MasterError;
use crate::event_bus::EventBus;
use crate::rpc::MasterRpc;
use crate::scheduler::Scheduler;
use crate::state::{shared, SharedState};
use crate::worker_client::{NotificationHandler, WorkerClient};
use mirrord_backends::{BackendRegistry, WorkerDispatch};
use mirrord_core::event::Event;
use mirrord_core::{Clock, Package, PackageId, PackageStatus, SystemClock};
use mirrord_wire::NotificationEvent;
use std::collections::HashSet;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run(config_path: &Path) -> Result<(), MasterError> {
    let registry = Arc::new(BackendRegistry::with_default_backends());
    let known_backends = registry.names();
    let (config, packages) = mirrord_storage::load(config_path, &known_backends)?;

    init_logging(&config.logfolder);
    tracing::info!(
        config = %config_path.display(),
        packages = packages.len(),
        "master starting up"
    );

    let master_socket = config.master_socket.clone();
    let worker_socket = config.worker_socket.clone();
    let state = shared(config, packages);

    let events = EventBus::new();
    events.publish_and_wait(Event::MasterInitPre).await;

    let notification_state = Arc::clone(&state);
    let notification_events = events.clone();
    let on_notification: NotificationHandler = Arc::new(move |event| {
        let state = Arc::clone(&notification_state);
        let events = notification_events.clone();
        tokio::spawn(handle_notification(state, events, event));
    });

    let worker = Arc::new(
        WorkerClient::connect(&worker_socket, env!("CARGO_PKG_VERSION"), on_notification).await?,
    );

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&state),
        Arc::clone(&registry),
        Arc::clone(&worker) as Arc<dyn WorkerDispatch>,
        events.clone(),
        SystemClock,
    ));

    let rpc = Arc::new(MasterRpc::new(
        Arc::clone(&state),
        Arc::clone(&worker),
        env!("CARGO_PKG_VERSION").to_string(),
        master_socket.clone(),
    ));
    let listener = bind_unix_socket(&master_socket).await?;

    let rpc_task = {
        let rpc = Arc::clone(&rpc);
        tokio::spawn(async move { rpc.serve(listener).await })
    };

    let shutdown = CancellationToken::new();
    let scheduler_task = {
        let shutdown = shutdown.clone();
        let state = Arc::clone(&state);
        tokio::spawn(scheduler_loop(scheduler, worker, state, shutdown))
    };

    events.publish(Event::MasterInitPost).await;

    wait_for_shutdown_signal().await?;
    tracing::info!("shutdown signal received, draining scheduler tick and closing sockets");
    shutdown.cancel();
    rpc_task.abort();
    let _ = scheduler_task.await;

    let _ = std::fs::remove_file(&master_socket);
    Ok(())
}

/// Create the parent directory if needed, refuse to start if a live peer
/// answers the existing socket file, and otherwise unlink the stale file and
/// bind fresh (`spec.md` §5: "the daemon refuses to start if a live peer is
/// detected on the socket").
async fn bind_unix_socket(path: &Path) -> Result<UnixListener, MasterError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if path.exists() {
        if UnixStream::connect(path).await.is_ok() {
            return Err(MasterError::AlreadyRunning(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(listener)
}

async fn scheduler_loop(
    scheduler: Arc<Scheduler<SystemClock>>,
    worker: Arc<WorkerClient>,
    state: SharedState,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let active_jobs = match worker.status().await {
                    Ok(status) => status.active_jobs.into_iter().collect::<HashSet<_>>(),
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to poll worker status this tick");
                        HashSet::new()
                    }
                };
                let changed = scheduler.tick(&active_jobs).await;
                if !changed.is_empty() {
                    if let Err(err) = persist(&state) {
                        tracing::error!(error = %err, "failed to persist after a scheduler tick");
                    }
                }
            }
        }
    }
}

/// Apply a `job_finished` notification to the package it names and persist
/// the result. Runs off the reader task (`WorkerClient`'s background
/// reader), so it mutates `state` independently of the scheduler tick —
/// still serialised by the same lock (`spec.md` §5's per-package ordering
/// guarantee).
async fn handle_notification(state: SharedState, events: EventBus, event: NotificationEvent) {
    let NotificationEvent::JobFinished { job_id, success, returncode } = event;
    let pkgid = PackageId::new(job_id.0.clone());

    events.publish_and_wait(Event::PackageStatusUpdatePre { pkgid: pkgid.clone() }).await;

    let applied = {
        let mut guard = state.lock();
        match guard.packages.get_mut(&pkgid) {
            Some(pkg) => {
                let now_ms = SystemClock.epoch_ms();
                pkg.lastsync = SystemClock.epoch_secs_f64();
                let target = if success { PackageStatus::Active } else { PackageStatus::Error };
                pkg.transition(target, now_ms).is_ok()
            }
            None => {
                tracing::warn!(pkgid = %pkgid, "job_finished notification for unknown package");
                false
            }
        }
    };

    if applied {
        tracing::info!(pkgid = %pkgid, success, returncode, "job finished");
        if let Err(err) = persist(&state) {
            tracing::error!(error = %err, "failed to persist after job_finished");
        }
    }

    events.publish(Event::PackageStatusUpdatePost { pkgid }).await;
}

fn persist(state: &SharedState) -> Result<(), MasterError> {
    let guard = state.lock();
    let packages: Vec<Package> = guard.packages.iter_in_order().cloned().collect();
    mirrord_storage::persist_stat(&guard.config.statfile, &packages)?;
    let snapshot = mirrord_storage::build_snapshot(&guard.config, &packages, SystemClock.epoch_ms());
    mirrord_storage::write_snapshot(&guard.config.statusfile, &snapshot)?;
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<(), MasterError> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

fn init_logging(logfolder: &Path) {
    let file_appender = tracing_appender::rolling::daily(logfolder, "master.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    // Leaked deliberately: the guard must outlive the process to flush
    // buffered lines, and this function runs exactly once at startup.
    std::mem::forget(guard);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_writer(writer).with_env_filter(filter).try_init();
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
