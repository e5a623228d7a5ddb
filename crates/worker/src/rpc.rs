// SPDX-License-Identifier: MIT

//! Worker control socket RPC server (`spec.md` §4.5, §6).
//!
//! Unlike the master's short-lived admin connections, the worker expects one
//! long-lived connection from the master that also carries unsolicited
//! `job_finished` notifications, so each accepted connection is registered
//! with [`ClientRegistry`] for the lifetime of the connection, not just for
//! the duration of a single request.

use crate::clients::ClientRegistry;
use crate::error::WorkerError;
use crate::job::JobRegistry;
use mirrord_core::JobId;
use mirrord_wire::{
    receive, send, server_handshake, JobProgressInfo, JobStartedInfo, Notification, ProtocolError,
    Request, Response, Role, WorkerCommand, WorkerStatusInfo, APP_NAME,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};

/// Grace period between `SIGTERM` and `SIGKILL` when stopping a job
/// (`spec.md` §5).
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Cap on jobs awaiting delivery of their `job_finished` notification with
/// no client currently connected (`spec.md` §9 Open Question, resolved:
/// bounded queue rather than unbounded retry). Once the cap is hit the
/// oldest pending job is force-dropped from the registry so a worker with
/// no master ever connecting does not grow `JobRegistry` without bound.
const MAX_UNDELIVERED_NOTIFICATIONS: usize = 256;

pub struct WorkerRpc {
    jobs: JobRegistry,
    clients: ClientRegistry,
    app_version: String,
    socket_path: PathBuf,
    undelivered: Mutex<VecDeque<JobId>>,
}

impl WorkerRpc {
    pub fn new(app_version: String, socket_path: PathBuf) -> Self {
        Self {
            jobs: JobRegistry::new(),
            clients: ClientRegistry::new(),
            app_version,
            socket_path,
            undelivered: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn serve(self: Arc<Self>, listener: UnixListener) {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::error!(error = %err, "worker rpc accept failed");
                    continue;
                }
            };
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = this.handle_connection(stream).await {
                    tracing::debug!(error = %err, "worker rpc connection ended");
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: UnixStream) -> Result<(), ProtocolError> {
        server_handshake(&mut stream, APP_NAME, &self.app_version, Role::Worker).await?;

        let (mut read_half, write_half) = stream.into_split();
        let handle = self.clients.register(write_half);

        let result = loop {
            let request: Request = match receive(&mut read_half).await {
                Ok(req) => req,
                Err(ProtocolError::ConnectionClosed) => break Ok(()),
                Err(err) => break Err(err),
            };
            let response = self.handle_request(&request).await;
            let mut write_half = handle.lock().await;
            if let Err(err) = send(&mut *write_half, &response).await {
                break Err(err);
            }
        };

        self.clients.unregister(&handle);
        result
    }

    /// Reap finished jobs and push a `job_finished` notification for each;
    /// a job is only dropped from the registry once at least one listener
    /// acknowledges it (`spec.md` §4.5), so a worker with no master
    /// currently connected just keeps retrying on the next sweep.
    pub async fn prune_finished(&self) {
        for (job_id, success, returncode) in self.jobs.finished() {
            let notification = Notification::job_finished(job_id.clone(), success, returncode);
            let delivered = self.clients.broadcast(&notification).await;
            if delivered > 0 {
                self.jobs.remove(&job_id);
                self.untrack_undelivered(&job_id);
            } else {
                tracing::debug!(job_id = %job_id, "job_finished notification undelivered, will retry");
                self.track_undelivered(job_id);
            }
        }
    }

    /// Record a job as awaiting delivery, force-dropping the oldest pending
    /// job once the queue exceeds [`MAX_UNDELIVERED_NOTIFICATIONS`].
    fn track_undelivered(&self, job_id: JobId) {
        let mut pending = self.undelivered.lock();
        if !pending.contains(&job_id) {
            pending.push_back(job_id);
        }
        while pending.len() > MAX_UNDELIVERED_NOTIFICATIONS {
            if let Some(oldest) = pending.pop_front() {
                tracing::warn!(
                    job_id = %oldest,
                    cap = MAX_UNDELIVERED_NOTIFICATIONS,
                    "undelivered job_finished queue at cap, dropping oldest notification"
                );
                self.jobs.remove(&oldest);
            }
        }
    }

    fn untrack_undelivered(&self, job_id: &JobId) {
        self.undelivered.lock().retain(|id| id != job_id);
    }

    async fn handle_request(&self, request: &Request) -> Response {
        let Some(command) = WorkerCommand::from_request(request) else {
            return Response::not_found(format!("unknown command {:?}", request.command));
        };

        match command {
            WorkerCommand::Ping => Response::ok(serde_json::json!({ "message": "pong" })),
            WorkerCommand::Status => {
                self.prune_finished().await;
                Response::ok(self.status_payload())
            }
            WorkerCommand::ExecuteCommand {
                job_id,
                commandline,
                env,
                sync_method,
                uid,
                gid,
                nice,
                log_path,
            } => self.execute_command(job_id, commandline, env, sync_method, uid, gid, nice, log_path),
            WorkerCommand::StopCommand { job_id } => self.stop_command(job_id).await,
            WorkerCommand::GetProgress { job_id } => {
                self.prune_finished().await;
                self.get_progress(job_id)
            }
        }
    }

    fn status_payload(&self) -> serde_json::Value {
        let info = WorkerStatusInfo {
            running: true,
            role: "worker".to_string(),
            version: self.app_version.clone(),
            socket: self.socket_path.display().to_string(),
            active_jobs: self.jobs.active_job_ids(),
        };
        serde_json::to_value(info).unwrap_or(serde_json::Value::Null)
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_command(
        &self,
        job_id: JobId,
        commandline: Vec<String>,
        env: std::collections::BTreeMap<String, String>,
        sync_method: String,
        uid: Option<u32>,
        gid: Option<u32>,
        nice: Option<i32>,
        log_path: Option<PathBuf>,
    ) -> Response {
        let uid = uid.unwrap_or_else(|| nix::unistd::getuid().as_raw());
        let gid = gid.unwrap_or_else(|| nix::unistd::getgid().as_raw());

        tracing::info!(job_id = %job_id, sync_method = %sync_method, uid, gid, ?nice, "starting job");
        match self.jobs.create(job_id.clone(), commandline, env, uid, gid, nice, log_path) {
            Ok(pid) => {
                serde_json::to_value(JobStartedInfo::new(job_id, pid)).map(Response::ok).unwrap_or_else(
                    |err| Response::handler_error(format!("failed to encode job: {err}"), None),
                )
            }
            Err(WorkerError::JobAlreadyExists(id)) => {
                Response::handler_error(format!("job {id:?} already exists"), None)
            }
            Err(err) => Response::handler_error(format!("failed to start job: {err}"), None),
        }
    }

    async fn stop_command(&self, job_id: Option<JobId>) -> Response {
        let stopped = self.jobs.stop(job_id, STOP_GRACE).await;
        Response::ok(serde_json::json!({ "stopped": stopped }))
    }

    /// Stop every running job with the standard grace period. Used on
    /// shutdown so in-flight transfers are terminated cleanly rather than
    /// left orphaned when the worker process exits.
    pub async fn stop_all(&self) -> Vec<JobId> {
        self.jobs.stop(None, STOP_GRACE).await
    }

    fn get_progress(&self, job_id: Option<JobId>) -> Response {
        match job_id {
            Some(id) => match self.jobs.snapshot(&id) {
                Some(snap) => {
                    let info = JobProgressInfo {
                        job_id: snap.job_id,
                        running: snap.running,
                        uptime_secs: snap.uptime_secs,
                        pid: snap.pid,
                        recent_output: snap.recent_output,
                    };
                    serde_json::to_value(info).map(Response::ok).unwrap_or_else(|err| {
                        Response::handler_error(format!("failed to encode progress: {err}"), None)
                    })
                }
                None => Response::not_found(format!("unknown job {id:?}")),
            },
            // No id means "summarize over all jobs". `get_progress`'s wire
            // contract always carries a single `JobProgressInfo`, so this
            // folds the whole registry into one: running if anything is,
            // uptime/pid left at zero since neither has one sensible value
            // across multiple jobs.
            None => {
                let all = self.jobs.snapshot_all();
                let info = JobProgressInfo {
                    job_id: JobId::new(""),
                    running: all.iter().any(|j| j.running),
                    uptime_secs: 0,
                    pid: 0,
                    recent_output: String::new(),
                };
                serde_json::to_value(info).map(Response::ok).unwrap_or_else(|err| {
                    Response::handler_error(format!("failed to encode progress: {err}"), None)
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
