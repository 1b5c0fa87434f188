//! End-to-end dispatcher and batch tests against real subprocesses.
//!
//! Uses `sh` as a stand-in worker: the dispatcher hands it
//! `--config <path>` plus the built flags as positional parameters, and
//! the scripts branch on the config path to simulate success and failure.

use std::collections::BTreeMap;
use std::path::Path;

use briefctl_core::flags::ParameterSet;
use briefctl_core::types::{JobSpec, ServiceMode};
use briefctl_runner::{backend_env, run_all, run_job, JobOutcome, JobRequest, WorkerCommand};

/// A `sh`-based worker. The trailing `worker` argument becomes `$0`, so
/// the dispatcher-appended `--config <path> <flags...>` arrive as `$1…`.
fn sh_worker(script: &str) -> WorkerCommand {
    WorkerCommand {
        program: "sh".to_string(),
        base_args: vec!["-c".to_string(), script.to_string(), "worker".to_string()],
    }
}

fn job(dir: &Path, name: &str) -> JobSpec {
    JobSpec {
        name: name.to_string(),
        config_path: dir.join(format!("{name}.yaml")),
        output_dir: dir.join(name),
    }
}

fn request(dir: &Path, name: &str) -> JobRequest {
    JobRequest {
        job: job(dir, name),
        params: ParameterSet::new(),
        env: backend_env(ServiceMode::Local, "http://127.0.0.1:8080"),
        log_path: dir.join(format!("{name}.log")),
    }
}

#[tokio::test]
async fn run_job_returns_worker_exit_code_unmodified() {
    let dir = tempfile::tempdir().unwrap();
    let worker = sh_worker("exit 7");
    let code = run_job(
        &worker,
        &job(dir.path(), "rss"),
        &ParameterSet::new(),
        &BTreeMap::new(),
        &dir.path().join("rss.log"),
    )
    .await
    .unwrap();
    assert_eq!(code, 7);
}

#[tokio::test]
async fn run_job_passes_config_and_flags_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let worker = sh_worker(r#"echo "argv: $@""#);
    let mut params = ParameterSet::new();
    params.enable("dedup").set("pack-budget", "6000");

    let log_path = dir.path().join("rss.log");
    let code = run_job(
        &worker,
        &job(dir.path(), "rss"),
        &params,
        &BTreeMap::new(),
        &log_path,
    )
    .await
    .unwrap();
    assert_eq!(code, 0);

    let log = std::fs::read_to_string(&log_path).unwrap();
    let expected = format!(
        "argv: --config {} --dedup --pack-budget 6000",
        dir.path().join("rss.yaml").display()
    );
    assert!(log.contains(&expected), "log was: {log}");
}

#[tokio::test]
async fn run_job_injects_backend_mode_env() {
    let dir = tempfile::tempdir().unwrap();
    let worker = sh_worker(r#"echo "mode=$MODE origin=$ORIGIN""#);
    let env = backend_env(ServiceMode::Containerized, "http://embed:3000");

    let log_path = dir.path().join("reddit.log");
    run_job(
        &worker,
        &job(dir.path(), "reddit"),
        &ParameterSet::new(),
        &env,
        &log_path,
    )
    .await
    .unwrap();

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("mode=containerized origin=http://embed:3000"));
}

#[tokio::test]
async fn run_job_captures_stderr_in_the_same_sink() {
    let dir = tempfile::tempdir().unwrap();
    let worker = sh_worker("echo out; echo err >&2; exit 1");
    let log_path = dir.path().join("hn.log");
    let code = run_job(
        &worker,
        &job(dir.path(), "hn"),
        &ParameterSet::new(),
        &BTreeMap::new(),
        &log_path,
    )
    .await
    .unwrap();
    assert_eq!(code, 1);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("out"));
    assert!(log.contains("err"));
}

#[tokio::test]
async fn run_job_launch_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let worker = WorkerCommand::new("briefctl-no-such-worker");
    let result = run_job(
        &worker,
        &job(dir.path(), "rss"),
        &ParameterSet::new(),
        &BTreeMap::new(),
        &dir.path().join("rss.log"),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn batch_isolates_one_failing_job() {
    let dir = tempfile::tempdir().unwrap();
    // Branch on the config path ($2): the "reddit" job fails, others pass.
    let worker = sh_worker(
        r#"echo "collecting from $2"; case "$2" in *reddit*) echo "fetch failed" >&2; exit 3;; esac"#,
    );

    let requests: Vec<JobRequest> = ["hackernews", "reddit", "rss"]
        .iter()
        .map(|name| request(dir.path(), name))
        .collect();

    let result = run_all(&worker, requests).await;

    assert_eq!(result.aggregate_status(), 1);
    assert_eq!(result.failed_jobs(), vec!["reddit"]);
    assert_eq!(
        result.per_job["hackernews"],
        JobOutcome::Exited { exit_code: 0 }
    );
    assert_eq!(result.per_job["reddit"], JobOutcome::Exited { exit_code: 3 });
    assert_eq!(result.per_job["rss"], JobOutcome::Exited { exit_code: 0 });
    assert!(result.unaccounted.is_empty());
}

#[tokio::test]
async fn batch_log_sinks_are_separate_and_non_empty() {
    let dir = tempfile::tempdir().unwrap();
    let worker = sh_worker(r#"echo "collecting from $2""#);

    let names = ["hackernews", "reddit", "rss"];
    let requests: Vec<JobRequest> = names.iter().map(|n| request(dir.path(), n)).collect();

    let result = run_all(&worker, requests).await;
    assert_eq!(result.aggregate_status(), 0);

    for name in names {
        let log = std::fs::read_to_string(dir.path().join(format!("{name}.log"))).unwrap();
        assert!(!log.is_empty());
        // Each sink carries only its own job's line.
        assert!(log.contains(&format!("{name}.yaml")), "log was: {log}");
        for other in names.iter().filter(|o| **o != name) {
            assert!(!log.contains(&format!("{other}.yaml")), "log was: {log}");
        }
    }
}

#[tokio::test]
async fn batch_records_launch_failure_without_cancelling_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let worker = sh_worker("exit 0");

    let mut requests: Vec<JobRequest> = vec![request(dir.path(), "rss")];
    // A log sink path that is a directory fails the dispatch before spawn.
    let mut broken = request(dir.path(), "reddit");
    std::fs::create_dir_all(dir.path().join("reddit.log")).unwrap();
    broken.log_path = dir.path().join("reddit.log");
    requests.push(broken);

    let result = run_all(&worker, requests).await;

    assert_eq!(result.aggregate_status(), 1);
    assert_eq!(result.per_job["rss"], JobOutcome::Exited { exit_code: 0 });
    assert!(matches!(
        result.per_job["reddit"],
        JobOutcome::LaunchFailed { .. }
    ));
}

#[tokio::test]
async fn batch_of_empty_request_list_succeeds() {
    let worker = sh_worker("exit 0");
    let result = run_all(&worker, Vec::new()).await;
    assert_eq!(result.aggregate_status(), 0);
    assert!(result.per_job.is_empty());
}
