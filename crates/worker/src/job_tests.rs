use super::*;

fn current_ids() -> (u32, u32) {
    (nix::unistd::getuid().as_raw(), nix::unistd::getgid().as_raw())
}

#[tokio::test]
async fn create_spawns_and_tracks_a_running_job() {
    let registry = JobRegistry::new();
    let (uid, gid) = current_ids();

    let pid = registry
        .create(
            JobId::new("debian"),
            vec!["sh".to_string(), "-c".to_string(), "sleep 1".to_string()],
            BTreeMap::new(),
            uid,
            gid,
            None,
            None,
        )
        .expect("spawn should succeed");
    assert!(pid > 0);

    let snap = registry.snapshot(&JobId::new("debian")).expect("job present");
    assert!(snap.running);
    assert_eq!(snap.pid, pid);

    registry.stop(Some(JobId::new("debian")), Duration::from_millis(50)).await;
}

#[tokio::test]
async fn create_rejects_a_duplicate_job_id() {
    let registry = JobRegistry::new();
    let (uid, gid) = current_ids();

    registry
        .create(JobId::new("debian"), vec!["true".to_string()], BTreeMap::new(), uid, gid, None, None)
        .expect("first spawn should succeed");

    let err = registry
        .create(JobId::new("debian"), vec!["true".to_string()], BTreeMap::new(), uid, gid, None, None)
        .unwrap_err();
    assert!(matches!(err, WorkerError::JobAlreadyExists(id) if id == "debian"));
}

#[tokio::test]
async fn finished_reports_an_exited_job_without_removing_it() {
    let registry = JobRegistry::new();
    let (uid, gid) = current_ids();

    registry
        .create(JobId::new("debian"), vec!["true".to_string()], BTreeMap::new(), uid, gid, None, None)
        .expect("spawn should succeed");

    // Give the child a moment to exit and be reaped by try_wait.
    for _ in 0..50 {
        if !registry.finished().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let finished = registry.finished();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].0, JobId::new("debian"));
    assert!(finished[0].1);

    // Still present until explicitly removed.
    assert!(registry.snapshot(&JobId::new("debian")).is_some());
    registry.remove(&JobId::new("debian"));
    assert!(registry.snapshot(&JobId::new("debian")).is_none());
}

#[tokio::test]
async fn stop_sends_sigterm_and_reports_the_job_as_stopped() {
    let registry = JobRegistry::new();
    let (uid, gid) = current_ids();

    registry
        .create(
            JobId::new("debian"),
            vec!["sh".to_string(), "-c".to_string(), "sleep 5".to_string()],
            BTreeMap::new(),
            uid,
            gid,
            None,
            None,
        )
        .expect("spawn should succeed");

    let stopped = registry.stop(Some(JobId::new("debian")), Duration::from_millis(200)).await;
    assert_eq!(stopped, vec![JobId::new("debian")]);

    for _ in 0..50 {
        if let Some(snap) = registry.snapshot(&JobId::new("debian")) {
            if !snap.running {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job was not terminated within the test budget");
}

#[tokio::test]
async fn stop_with_no_id_stops_every_running_job() {
    let registry = JobRegistry::new();
    let (uid, gid) = current_ids();

    for name in ["debian", "ubuntu"] {
        registry
            .create(
                JobId::new(name),
                vec!["sh".to_string(), "-c".to_string(), "sleep 5".to_string()],
                BTreeMap::new(),
                uid,
                gid,
                None,
                None,
            )
            .expect("spawn should succeed");
    }

    let mut stopped = registry.stop(None, Duration::from_millis(200)).await;
    stopped.sort();
    assert_eq!(stopped, vec![JobId::new("debian"), JobId::new("ubuntu")]);
}

#[tokio::test]
async fn create_merges_stdout_and_stderr_into_the_log_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("nested").join("debian.log");
    let registry = JobRegistry::new();
    let (uid, gid) = current_ids();

    registry
        .create(
            JobId::new("debian"),
            vec!["sh".to_string(), "-c".to_string(), "echo out; echo err 1>&2".to_string()],
            BTreeMap::new(),
            uid,
            gid,
            None,
            Some(log_path.clone()),
        )
        .expect("spawn should succeed");

    for _ in 0..50 {
        if !registry.finished().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let contents = std::fs::read_to_string(&log_path).expect("log file should exist");
    assert!(contents.contains("out"));
    assert!(contents.contains("err"));
}

#[tokio::test]
async fn create_without_a_log_path_captures_output_in_the_ring_buffer() {
    let registry = JobRegistry::new();
    let (uid, gid) = current_ids();

    registry
        .create(
            JobId::new("debian"),
            vec!["sh".to_string(), "-c".to_string(), "echo hello; echo world 1>&2".to_string()],
            BTreeMap::new(),
            uid,
            gid,
            None,
            None,
        )
        .expect("spawn should succeed");

    let mut snap = registry.snapshot(&JobId::new("debian")).expect("job present");
    for _ in 0..50 {
        if snap.recent_output.contains("hello") && snap.recent_output.contains("world") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        snap = registry.snapshot(&JobId::new("debian")).expect("job present");
    }
    assert!(snap.recent_output.contains("hello"));
    assert!(snap.recent_output.contains("world"));
}
