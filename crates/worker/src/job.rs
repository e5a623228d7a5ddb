// SPDX-License-Identifier: MIT

//! Job registry: the worker's view of the OS processes it has spawned
//! (`spec.md` §4.5).
//!
//! Termination is observed by polling (`Child::try_wait`), never by a
//! signal handler — matching the source's poll-per-tick reap loop (`spec.md`
//! §5: "their termination is observed by polling the OS").

use crate::error::WorkerError;
use mirrord_core::JobId;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// Cap on the in-memory output ring buffer kept for jobs started without a
/// `log_path` (`spec.md` §4.5).
const OUTPUT_CAP: usize = 64 * 1024;

/// Bounded byte buffer backing a log-path-less job's captured output;
/// pushes drop the oldest bytes once the cap is exceeded, so `snapshot`
/// always returns at most the trailing `OUTPUT_CAP` bytes.
#[derive(Default)]
struct RingBuffer {
    buf: VecDeque<u8>,
}

impl RingBuffer {
    fn push(&mut self, data: &[u8]) {
        self.buf.extend(data.iter().copied());
        let excess = self.buf.len().saturating_sub(OUTPUT_CAP);
        self.buf.drain(..excess);
    }

    fn snapshot(&self) -> String {
        let bytes: Vec<u8> = self.buf.iter().copied().collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

struct Job {
    commandline: Vec<String>,
    uid: u32,
    gid: u32,
    nice: Option<i32>,
    pid: u32,
    child: Child,
    started_at: Instant,
    output: Option<Arc<Mutex<RingBuffer>>>,
}

impl Job {
    /// `try_wait` is non-blocking and caches the exit status once the child
    /// has been reaped, so repeated calls are cheap and idempotent.
    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub pid: u32,
    pub running: bool,
    pub uptime_secs: u64,
    pub commandline: Vec<String>,
    pub uid: u32,
    pub gid: u32,
    pub nice: Option<i32>,
    pub recent_output: String,
}

/// Registry of jobs the worker has started, guarded by a single mutex.
/// Operations are serialised per-job in effect (the whole map is locked for
/// each op), matching the source's single-process dict plus the spec's
/// allowance that "operations across different jobs may run in parallel" is
/// only a concurrency ceiling, not a requirement.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a new job. Child setup order is group, then user, then
    /// niceness, enforced by `Command::gid`/`Command::uid` (applied by the
    /// standard library in that order before exec) and by wrapping the
    /// argv with `nice -n <value>` when a niceness is requested — there is
    /// no safe way to adjust niceness from inside the child after fork
    /// without `pre_exec`, which this workspace forbids as unsafe code.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        job_id: JobId,
        commandline: Vec<String>,
        env: BTreeMap<String, String>,
        uid: u32,
        gid: u32,
        nice: Option<i32>,
        log_path: Option<PathBuf>,
    ) -> Result<u32, WorkerError> {
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(&job_id) {
            return Err(WorkerError::JobAlreadyExists(job_id.0));
        }

        let mut argv = commandline.clone();
        if let Some(nice) = nice {
            let mut wrapped = vec!["nice".to_string(), "-n".to_string(), nice.to_string()];
            wrapped.append(&mut argv);
            argv = wrapped;
        }
        let Some((program, args)) = argv.split_first() else {
            return Err(WorkerError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty commandline",
            )));
        };

        let (stdout, stderr, output) = match &log_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(WorkerError::Spawn)?;
                }
                // Two independent fds appending to the same path: POSIX
                // O_APPEND makes each write() atomic, so stdout and stderr
                // interleave correctly without needing to dup2 one onto the
                // other (the source's `subprocess.STDOUT` trick).
                let out = open_log(path)?;
                let err = open_log(path)?;
                (Stdio::from(out), Stdio::from(err), None)
            }
            // No log path: pipe both streams and drain them into a bounded
            // in-memory ring buffer instead of discarding the output, so
            // `get_progress` can still report trailing output for these
            // jobs (`spec.md` §4.5).
            None => (Stdio::piped(), Stdio::piped(), Some(Arc::new(Mutex::new(RingBuffer::default())))),
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&env)
            .uid(uid)
            .gid(gid)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(false);

        let mut child = cmd.spawn().map_err(WorkerError::Spawn)?;
        let pid = child
            .id()
            .ok_or_else(|| WorkerError::Spawn(std::io::Error::other("spawned child has no pid")))?;

        if let Some(buf) = &output {
            if let Some(stdout) = child.stdout.take() {
                spawn_drain(stdout, Arc::clone(buf));
            }
            if let Some(stderr) = child.stderr.take() {
                spawn_drain(stderr, Arc::clone(buf));
            }
        }

        jobs.insert(job_id, Job { commandline, uid, gid, nice, pid, child, started_at: Instant::now(), output });
        Ok(pid)
    }

    pub fn snapshot(&self, job_id: &JobId) -> Option<JobSnapshot> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(job_id)?;
        Some(to_snapshot(job_id, job))
    }

    pub fn snapshot_all(&self) -> Vec<JobSnapshot> {
        let mut jobs = self.jobs.lock();
        jobs.iter_mut().map(|(id, job)| to_snapshot(id, job)).collect()
    }

    pub fn active_job_ids(&self) -> Vec<JobId> {
        let mut jobs = self.jobs.lock();
        jobs.iter_mut().filter(|(_, job)| job.is_running()).map(|(id, _)| id.clone()).collect()
    }

    /// Jobs whose process has exited since the last sweep, as
    /// `(job_id, success, returncode)`. Does not remove them — the caller
    /// removes a job only once its `job_finished` notification has reached
    /// at least one listener (`spec.md` §4.5).
    pub fn finished(&self) -> Vec<(JobId, bool, i32)> {
        let mut jobs = self.jobs.lock();
        jobs.iter_mut()
            .filter_map(|(id, job)| {
                let status = job.child.try_wait().ok()??;
                Some((id.clone(), status.success(), status.code().unwrap_or(-1)))
            })
            .collect()
    }

    pub fn remove(&self, job_id: &JobId) {
        self.jobs.lock().remove(job_id);
    }

    /// Terminate the given job, or every running job if `job_id` is `None`.
    /// Sends `SIGTERM`, waits up to `grace`, then `SIGKILL`s anything still
    /// alive. Returns the ids that were signalled.
    pub async fn stop(&self, job_id: Option<JobId>, grace: Duration) -> Vec<JobId> {
        let targets: Vec<(JobId, u32)> = {
            let mut jobs = self.jobs.lock();
            match job_id {
                Some(id) => match jobs.get_mut(&id) {
                    Some(job) if job.is_running() => vec![(id, job.pid)],
                    _ => Vec::new(),
                },
                None => jobs
                    .iter_mut()
                    .filter(|(_, job)| job.is_running())
                    .map(|(id, job)| (id.clone(), job.pid))
                    .collect(),
            }
        };

        for (_, pid) in &targets {
            send_signal(*pid, Signal::SIGTERM);
        }

        if !targets.is_empty() {
            tokio::time::sleep(grace).await;
        }

        let mut jobs = self.jobs.lock();
        for (id, pid) in &targets {
            if let Some(job) = jobs.get_mut(id) {
                if job.is_running() {
                    send_signal(*pid, Signal::SIGKILL);
                }
            }
        }
        targets.into_iter().map(|(id, _)| id).collect()
    }
}

fn to_snapshot(job_id: &JobId, job: &mut Job) -> JobSnapshot {
    JobSnapshot {
        job_id: job_id.clone(),
        pid: job.pid,
        running: job.is_running(),
        uptime_secs: job.started_at.elapsed().as_secs(),
        commandline: job.commandline.clone(),
        uid: job.uid,
        gid: job.gid,
        nice: job.nice,
        recent_output: job.output.as_ref().map(|buf| buf.lock().snapshot()).unwrap_or_default(),
    }
}

fn open_log(path: &std::path::Path) -> Result<std::fs::File, WorkerError> {
    std::fs::OpenOptions::new().create(true).append(true).open(path).map_err(WorkerError::Spawn)
}

/// Drain one pipe half into the shared ring buffer until EOF (the child
/// exiting or closing the descriptor).
fn spawn_drain(mut reader: impl tokio::io::AsyncRead + Unpin + Send + 'static, buf: Arc<Mutex<RingBuffer>>) {
    tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.lock().push(&chunk[..n]),
            }
        }
    });
}

fn send_signal(pid: u32, signal: Signal) {
    if let Err(err) = signal::kill(Pid::from_raw(pid as i32), signal) {
        tracing::warn!(pid, ?signal, error = %err, "failed to signal job process");
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
