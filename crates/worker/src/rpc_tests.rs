use super::*;
use mirrord_wire::{client_handshake, Request};
use tokio::net::UnixStream;

async fn setup() -> (Arc<WorkerRpc>, PathBuf, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket = dir.path().join("worker.sock");

    let rpc = Arc::new(WorkerRpc::new("0.0.0-test".to_string(), socket.clone()));
    let listener = tokio::net::UnixListener::bind(&socket).expect("bind worker socket");
    let serving = Arc::clone(&rpc);
    tokio::spawn(async move { serving.serve(listener).await });

    (rpc, socket, dir)
}

async fn client(socket: &PathBuf) -> UnixStream {
    let mut stream = UnixStream::connect(socket).await.expect("connect to worker socket");
    client_handshake(&mut stream, APP_NAME, "0.0.0-test", Role::Master).await.expect("handshake");
    stream
}

#[tokio::test]
async fn ping_replies_pong() {
    let (_rpc, socket, _dir) = setup().await;
    let mut stream = client(&socket).await;

    send(&mut stream, &Request::new("ping")).await.expect("send");
    let response: Response = receive(&mut stream).await.expect("receive");

    assert!(response.is_success());
    assert_eq!(response.data["message"], "pong");
}

#[tokio::test]
async fn status_reports_no_active_jobs_when_idle() {
    let (_rpc, socket, _dir) = setup().await;
    let mut stream = client(&socket).await;

    send(&mut stream, &WorkerCommand::Status.into_request()).await.expect("send");
    let response: Response = receive(&mut stream).await.expect("receive");

    assert!(response.is_success());
    assert_eq!(response.data["active_jobs"].as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn execute_command_starts_a_job_and_reports_its_pid() {
    let (_rpc, socket, _dir) = setup().await;
    let mut stream = client(&socket).await;

    let command = WorkerCommand::ExecuteCommand {
        job_id: JobId::new("debian"),
        commandline: vec!["true".to_string()],
        env: std::collections::BTreeMap::new(),
        sync_method: "rsync".to_string(),
        uid: None,
        gid: None,
        nice: None,
        log_path: None,
    };
    send(&mut stream, &command.into_request()).await.expect("send");
    let response: Response = receive(&mut stream).await.expect("receive");

    assert!(response.is_success());
    assert_eq!(response.data["job_id"], "debian");
    assert!(response.data["job_pid"].as_u64().expect("pid") > 0);
}

#[tokio::test]
async fn execute_command_rejects_a_duplicate_job_id() {
    let (_rpc, socket, _dir) = setup().await;
    let mut stream = client(&socket).await;

    let command = WorkerCommand::ExecuteCommand {
        job_id: JobId::new("debian"),
        commandline: vec!["sh".to_string(), "-c".to_string(), "sleep 1".to_string()],
        env: std::collections::BTreeMap::new(),
        sync_method: "rsync".to_string(),
        uid: None,
        gid: None,
        nice: None,
        log_path: None,
    };
    send(&mut stream, &command.clone().into_request()).await.expect("send first");
    let first: Response = receive(&mut stream).await.expect("receive first");
    assert!(first.is_success());

    send(&mut stream, &command.into_request()).await.expect("send second");
    let second: Response = receive(&mut stream).await.expect("receive second");
    assert_eq!(second.status, Response::HANDLER_ERROR);
}

#[tokio::test]
async fn get_progress_with_no_id_summarizes_across_jobs() {
    let (_rpc, socket, _dir) = setup().await;
    let mut stream = client(&socket).await;

    send(&mut stream, &WorkerCommand::GetProgress { job_id: None }.into_request()).await.expect("send");
    let response: Response = receive(&mut stream).await.expect("receive");

    assert!(response.is_success());
    assert_eq!(response.data["running"], false);
    assert_eq!(response.data["pid"], 0);
}

#[tokio::test]
async fn get_progress_for_unknown_job_is_not_found() {
    let (_rpc, socket, _dir) = setup().await;
    let mut stream = client(&socket).await;

    let command = WorkerCommand::GetProgress { job_id: Some(JobId::new("nope")) };
    send(&mut stream, &command.into_request()).await.expect("send");
    let response: Response = receive(&mut stream).await.expect("receive");

    assert_eq!(response.status, Response::NOT_FOUND);
}

#[tokio::test]
async fn track_undelivered_caps_the_pending_queue() {
    let (rpc, _socket, _dir) = setup().await;

    for i in 0..MAX_UNDELIVERED_NOTIFICATIONS + 10 {
        rpc.track_undelivered(JobId::new(format!("job-{i}")));
    }

    let pending = rpc.undelivered.lock();
    assert_eq!(pending.len(), MAX_UNDELIVERED_NOTIFICATIONS);
    // The oldest ids should have been dropped, the newest retained.
    assert!(!pending.contains(&JobId::new("job-0")));
    assert!(pending.contains(&JobId::new(format!("job-{}", MAX_UNDELIVERED_NOTIFICATIONS + 9))));
}

#[tokio::test]
async fn stop_command_reports_the_stopped_job_ids() {
    let (_rpc, socket, _dir) = setup().await;
    let mut stream = client(&socket).await;

    let start = WorkerCommand::ExecuteCommand {
        job_id: JobId::new("debian"),
        commandline: vec!["sh".to_string(), "-c".to_string(), "sleep 5".to_string()],
        env: std::collections::BTreeMap::new(),
        sync_method: "rsync".to_string(),
        uid: None,
        gid: None,
        nice: None,
        log_path: None,
    };
    send(&mut stream, &start.into_request()).await.expect("send start");
    let started: Response = receive(&mut stream).await.expect("receive start");
    assert!(started.is_success());

    let stop = WorkerCommand::StopCommand { job_id: Some(JobId::new("debian")) };
    send(&mut stream, &stop.into_request()).await.expect("send stop");
    let stopped: Response = receive(&mut stream).await.expect("receive stop");

    assert!(stopped.is_success());
    let ids = stopped.data["stopped"].as_array().expect("stopped array");
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0], "debian");
}
