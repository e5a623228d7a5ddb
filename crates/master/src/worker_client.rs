// SPDX-License-Identifier: MIT

//! The master's persistent connection to the worker control socket
//! (`spec.md` §4.5, §5, §6).
//!
//! One `UnixStream` carries both request/response traffic and unsolicited
//! `job_finished` notifications, so a background task owns the read half and
//! demultiplexes: a frame tagged `"type":"notification"` is handed to the
//! caller-supplied handler, anything else is matched against the oldest
//! outstanding request (worker responses come back in the order requests
//! were sent, never interleaved — `spec.md` §5).

use async_trait::async_trait;
use mirrord_backends::{DispatchAck, DispatchError, ExecuteCommandArgs, WorkerDispatch};
use mirrord_core::JobId;
use mirrord_wire::{
    client_handshake, decode, send, JobProgressInfo, JobStartedInfo, Notification,
    NotificationEvent, ProtocolError, Request, Response, Role, WorkerCommand, WorkerStatusInfo,
    APP_NAME,
};
use parking_lot::Mutex as SyncMutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

pub type NotificationHandler = Arc<dyn Fn(NotificationEvent) + Send + Sync>;

/// How long `call()` waits for a response before giving up on the worker
/// (`spec.md` §5: "implementation-defined... spec defines 30s default").
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

type PendingQueue = Arc<SyncMutex<VecDeque<oneshot::Sender<Response>>>>;

pub struct WorkerClient {
    write_half: AsyncMutex<OwnedWriteHalf>,
    pending: PendingQueue,
    reader: JoinHandle<()>,
}

impl WorkerClient {
    /// Connect to the worker's control socket, perform the capability
    /// handshake, and start the background reader task. `on_notification`
    /// is invoked (off the reader task) for every `job_finished` the worker
    /// pushes.
    pub async fn connect(
        socket_path: impl AsRef<Path>,
        app_version: &str,
        on_notification: NotificationHandler,
    ) -> Result<Self, ProtocolError> {
        let mut stream = UnixStream::connect(socket_path.as_ref()).await?;
        client_handshake(&mut stream, APP_NAME, app_version, Role::Master).await?;

        let (read_half, write_half) = stream.into_split();
        let pending: PendingQueue = Arc::new(SyncMutex::new(VecDeque::new()));
        let reader = tokio::spawn(run_reader(read_half, Arc::clone(&pending), on_notification));

        Ok(Self { write_half: AsyncMutex::new(write_half), pending, reader })
    }

    async fn call(&self, request: Request) -> Result<Response, DispatchError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut write_half = self.write_half.lock().await;
            self.pending.lock().push_back(tx);
            if let Err(err) = send(&mut *write_half, &request).await {
                // No response will ever arrive for this one; drop the slot
                // we just reserved so later replies don't shift out of sync.
                self.pending.lock().pop_back();
                return Err(DispatchError::Protocol(err));
            }
        }
        match tokio::time::timeout(RESPONSE_TIMEOUT, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(DispatchError::Rejected {
                status: 0,
                message: "worker connection closed before responding".to_string(),
            }),
            // The pending slot stays queued: when (if ever) the matching
            // response does arrive, it pops this dropped sender instead of
            // shifting out of sync with later requests.
            Err(_) => Err(DispatchError::Rejected {
                status: 0,
                message: format!("worker did not respond within {RESPONSE_TIMEOUT:?}"),
            }),
        }
    }

    pub async fn ping(&self) -> Result<(), DispatchError> {
        let response = self.call(WorkerCommand::Ping.into_request()).await?;
        require_success(&response)
    }

    pub async fn status(&self) -> Result<WorkerStatusInfo, DispatchError> {
        let response = self.call(WorkerCommand::Status.into_request()).await?;
        require_success(&response)?;
        decode_data(response)
    }

    pub async fn stop_command(&self, job_id: Option<JobId>) -> Result<(), DispatchError> {
        let response = self.call(WorkerCommand::StopCommand { job_id }.into_request()).await?;
        require_success(&response)
    }

    pub async fn get_progress(&self, job_id: Option<JobId>) -> Result<JobProgressInfo, DispatchError> {
        let response = self.call(WorkerCommand::GetProgress { job_id }.into_request()).await?;
        require_success(&response)?;
        decode_data(response)
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl WorkerDispatch for WorkerClient {
    async fn execute_command(&self, args: ExecuteCommandArgs) -> Result<DispatchAck, DispatchError> {
        let command = WorkerCommand::ExecuteCommand {
            job_id: args.job_id,
            commandline: args.commandline,
            env: args.env,
            sync_method: args.sync_method.to_string(),
            uid: args.uid,
            gid: args.gid,
            nice: args.nice,
            log_path: args.log_path,
        };
        let response = self.call(command.into_request()).await?;
        require_success(&response)?;
        let started: JobStartedInfo = decode_data(response)?;
        Ok(DispatchAck { job_pid: started.job_pid })
    }
}

fn require_success(response: &Response) -> Result<(), DispatchError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(DispatchError::Rejected { status: response.status, message: response.message.clone() })
    }
}

fn decode_data<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, DispatchError> {
    serde_json::from_value(response.data).map_err(|err| DispatchError::Rejected {
        status: 500,
        message: format!("malformed worker response: {err}"),
    })
}

async fn run_reader(mut read_half: OwnedReadHalf, pending: PendingQueue, on_notification: NotificationHandler) {
    loop {
        let body = match mirrord_wire::read_message(&mut read_half).await {
            Ok(body) => body,
            Err(ProtocolError::ConnectionClosed) => {
                tracing::info!("worker connection closed");
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, "worker connection read failed");
                break;
            }
        };

        if let Ok(notification) = decode::<Notification>(&body) {
            on_notification(notification.event);
            continue;
        }

        match decode::<Response>(&body) {
            Ok(response) => match pending.lock().pop_front() {
                Some(tx) => {
                    let _ = tx.send(response);
                }
                None => tracing::warn!("worker sent a response with no matching pending request"),
            },
            Err(err) => tracing::error!(error = %err, "failed to decode frame from worker"),
        }
    }

    // Fail every still-pending request rather than hanging its caller
    // forever; the sender side observes this as a closed channel.
    let mut queue = pending.lock();
    while let Some(tx) = queue.pop_front() {
        drop(tx);
    }
}

#[cfg(test)]
#[path = "worker_client_tests.rs"]
mod tests;
