// SPDX-License-Identifier: MIT

//! Startup, the periodic job-reaping sweep, and graceful shutdown
//! (`spec.md` §4.5, §5, §6).

use crate::error::WorkerError;
use crate::rpc::WorkerRpc;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

/// How often finished jobs are reaped and their notifications (re)tried
/// (`spec.md` §5: the worker's tick, same cadence as the master's).
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run(config_path: &Path) -> Result<(), WorkerError> {
    let config = mirrord_storage::load_settings(config_path)?;

    init_logging(&config.logfolder);
    tracing::info!(config = %config_path.display(), "worker starting up");

    let rpc = Arc::new(WorkerRpc::new(env!("CARGO_PKG_VERSION").to_string(), config.worker_socket.clone()));
    let listener = bind_unix_socket(&config.worker_socket).await?;

    let rpc_task = {
        let rpc = Arc::clone(&rpc);
        tokio::spawn(async move { rpc.serve(listener).await })
    };

    let shutdown = CancellationToken::new();
    let sweep_task = {
        let shutdown = shutdown.clone();
        let rpc = Arc::clone(&rpc);
        tokio::spawn(sweep_loop(rpc, shutdown))
    };

    wait_for_shutdown_signal().await?;
    tracing::info!("shutdown signal received, stopping jobs and closing sockets");
    shutdown.cancel();
    let _ = sweep_task.await;
    let stopped = rpc.stop_all().await;
    tracing::info!(count = stopped.len(), "stopped running jobs for shutdown");
    rpc_task.abort();

    let _ = std::fs::remove_file(&config.worker_socket);
    Ok(())
}

/// Create the parent directory if needed, refuse to start if a live peer
/// answers the existing socket file, and otherwise unlink the stale file and
/// bind fresh (`spec.md` §5: "the daemon refuses to start if a live peer is
/// detected on the socket").
async fn bind_unix_socket(path: &Path) -> Result<UnixListener, WorkerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if path.exists() {
        if UnixStream::connect(path).await.is_ok() {
            return Err(WorkerError::AlreadyRunning(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(listener)
}

async fn sweep_loop(rpc: Arc<WorkerRpc>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => rpc.prune_finished().await,
        }
    }
}

async fn wait_for_shutdown_signal() -> Result<(), WorkerError> {
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
    let file_appender = tracing_appender::rolling::daily(logfolder, "worker.log");
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
