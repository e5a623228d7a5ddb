// SPDX-License-Identifier: MIT

//! Shared fixtures for the end-to-end scenario tests (`spec.md` §8): config
//! file authoring and a stand-in worker control socket that plays the
//! `WorkerCommand` side of the protocol so the real master daemon can run
//! against it without a live transfer backend.

use mirrord_core::{JobId, PackageId};
use mirrord_wire::{
    client_handshake, receive, send, server_handshake, HandshakeInfo, JobStartedInfo, Notification,
    Request, Response, Role, WorkerCommand, WorkerStatusInfo, APP_NAME,
};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

pub fn now_secs() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock").as_secs_f64()
}

/// Build a minimal config document with one `packages` entry per
/// `(pkgid, syncrate)` pair, all using the `local` backend (never shells
/// out for real — dispatch is always intercepted by [`FakeWorker`]).
pub fn write_config(dir: &Path, packages: &[(&str, &str)]) -> PathBuf {
    let mut packages_obj = serde_json::Map::new();
    for (pkgid, syncrate) in packages {
        packages_obj.insert(
            pkgid.to_string(),
            serde_json::json!({
                "name": pkgid,
                "href": format!("/{pkgid}/"),
                "synctype": "local",
                "syncrate": syncrate,
                "src": format!("/nonexistent/upstream/{pkgid}"),
                "dst": dir.join("dst").join(pkgid).display().to_string(),
            }),
        );
    }

    let doc = serde_json::json!({
        "mirrorname": "test mirror",
        "hostname": "mirror.example.org",
        "settings": {
            "statfile": dir.join("stat.json"),
            "statusfile": dir.join("status.json"),
            "logfolder": dir.join("log"),
            "webroot": dir.join("web"),
            "errorcontinuetime": 2,
            "master_socket": dir.join("master.sock"),
            "worker_socket": dir.join("worker.sock"),
        },
        "packages": packages_obj,
    });

    let config_path = dir.join("config.json");
    std::fs::write(&config_path, serde_json::to_vec_pretty(&doc).expect("serialize config"))
        .expect("write config");
    config_path
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Succeed,
    Fail,
}

struct FakeWorkerState {
    outcome: DispatchOutcome,
    active_jobs: HashSet<JobId>,
    execute_count: usize,
}

/// Stands in for the `mirrord-worker` process: binds the worker socket the
/// master's `WorkerClient` dials, answers `status`/`execute_command`, and
/// (on a configured success) pushes the `job_finished` notification the
/// real worker would send once the backend process exits.
pub struct FakeWorker {
    pub socket_path: PathBuf,
    state: Arc<SyncMutex<FakeWorkerState>>,
    accept_task: JoinHandle<()>,
}

impl FakeWorker {
    pub async fn start(socket_path: PathBuf, outcome: DispatchOutcome) -> Self {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).expect("worker socket dir");
        }
        let listener = UnixListener::bind(&socket_path).expect("bind fake worker socket");
        let state = Arc::new(SyncMutex::new(FakeWorkerState {
            outcome,
            active_jobs: HashSet::new(),
            execute_count: 0,
        }));

        let task_state = Arc::clone(&state);
        let accept_task = tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else { return };
            serve_connection(stream, task_state).await;
        });

        Self { socket_path, state, accept_task }
    }

    pub fn execute_count(&self) -> usize {
        self.state.lock().execute_count
    }

    pub fn set_active_jobs(&self, jobs: &[&str]) {
        self.state.lock().active_jobs = jobs.iter().map(|j| JobId::new(*j)).collect();
    }
}

impl Drop for FakeWorker {
    fn drop(&mut self) {
        self.accept_task.abort();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn serve_connection(mut stream: UnixStream, state: Arc<SyncMutex<FakeWorkerState>>) {
    if server_handshake(&mut stream, APP_NAME, "0.0.0-test", Role::Worker).await.is_err() {
        return;
    }
    let (read_half, write_half) = stream.into_split();
    let write_half = Arc::new(tokio::sync::Mutex::new(write_half));
    let mut read_half = read_half;

    loop {
        let request: Request = match receive(&mut read_half).await {
            Ok(req) => req,
            Err(_) => break,
        };
        let Some(command) = WorkerCommand::from_request(&request) else {
            let _ = send(&mut *write_half.lock().await, &Response::not_found("unknown command")).await;
            continue;
        };

        match command {
            WorkerCommand::Ping => {
                let _ = send(&mut *write_half.lock().await, &Response::ok(serde_json::Value::Null)).await;
            }
            WorkerCommand::Status => {
                let active_jobs: Vec<JobId> = state.lock().active_jobs.iter().cloned().collect();
                let info = WorkerStatusInfo {
                    running: true,
                    role: "worker".to_string(),
                    version: "0.0.0-test".to_string(),
                    socket: "worker.sock".to_string(),
                    active_jobs,
                };
                let data = serde_json::to_value(info).expect("encode worker status");
                let _ = send(&mut *write_half.lock().await, &Response::ok(data)).await;
            }
            WorkerCommand::ExecuteCommand { job_id, .. } => {
                let outcome = {
                    let mut guard = state.lock();
                    guard.execute_count += 1;
                    guard.outcome
                };
                match outcome {
                    DispatchOutcome::Succeed => {
                        let info = JobStartedInfo::new(job_id.clone(), 4242);
                        let data = serde_json::to_value(info).expect("encode job started");
                        let _ = send(&mut *write_half.lock().await, &Response::ok(data)).await;

                        let notify_write = Arc::clone(&write_half);
                        tokio::spawn(async move {
                            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                            let notification = Notification::job_finished(job_id, true, 0);
                            let _ = send(&mut *notify_write.lock().await, &notification).await;
                        });
                    }
                    DispatchOutcome::Fail => {
                        let response = Response::handler_error("simulated transfer failure", None);
                        let _ = send(&mut *write_half.lock().await, &response).await;
                    }
                }
            }
            WorkerCommand::StopCommand { .. } => {
                let _ = send(&mut *write_half.lock().await, &Response::ok(serde_json::Value::Null)).await;
            }
            WorkerCommand::GetProgress { .. } => {
                let _ = send(&mut *write_half.lock().await, &Response::not_found("no jobs")).await;
            }
        }
    }
}

/// A short-lived, unauthenticated client of the master's admin socket —
/// enough to issue one `MasterCommand` and read the reply, without pulling
/// in `mirrordctl`'s own `AdminClient` (a separate binary crate).
pub async fn call_master(
    socket_path: &Path,
    command: mirrord_wire::MasterCommand,
) -> Result<Response, mirrord_wire::ProtocolError> {
    let mut stream = UnixStream::connect(socket_path).await?;
    client_handshake(&mut stream, APP_NAME, "0.0.0-test", Role::Client).await?;
    send(&mut stream, &command.into_request()).await?;
    receive(&mut stream).await
}

/// Perform the handshake with a deliberately wrong `protocol_version`,
/// bypassing `client_handshake` (which always sends the real constant) to
/// exercise the server's mismatch path (`spec.md` §8 scenario 5).
pub async fn handshake_with_bad_protocol_version(socket_path: &Path) -> Response {
    let mut stream = UnixStream::connect(socket_path).await.expect("connect");
    let _peer: HandshakeInfo = receive(&mut stream).await.expect("receive server handshake");

    let bad = HandshakeInfo {
        app_name: APP_NAME.to_string(),
        app_version: "0.0.0-test".to_string(),
        protocol_version: 999,
        is_server: false,
        role: Role::Client,
    };
    send(&mut stream, &bad).await.expect("send mismatched handshake");
    receive(&mut stream).await.expect("receive mismatch response")
}

pub fn package_id(name: &str) -> PackageId {
    PackageId::new(name)
}

/// Seed a stat file with one package already in `SYNC`, as if a prior
/// process crashed mid-transfer (`spec.md` §8 scenario 4).
pub fn seed_stale_sync_stat(dir: &Path, pkgid: &str, lastsync: f64) {
    let stat = serde_json::json!({
        pkgid: {
            "status": "SYNC",
            "statusinfo": {
                "errorcount": 0,
                "lastsync": lastsync,
                "timestamp": 0,
            }
        }
    });
    std::fs::write(dir.join("stat.json"), serde_json::to_vec_pretty(&stat).expect("serialize stat"))
        .expect("write stat");
}

#[allow(dead_code)]
pub fn decode_response<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_value(response.data).expect("decode response data")
}
