//! Single-job worker dispatch.
//!
//! Builds and launches the worker subprocess for one job: worker program,
//! `--config <job config>`, the ordered flag list, and the backend
//! mode/origin environment. Stdout and stderr both go to the job's log
//! sink. The exit code is returned unmodified; a nonzero code is reported,
//! not retried — retries are the caller's decision.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use briefctl_core::flags::ParameterSet;
use briefctl_core::types::{JobSpec, ServiceMode, KEY_MODE, KEY_ORIGIN};
use tokio::process::Command;

/// Environment handed to the worker, in deterministic key order.
pub type EnvMap = BTreeMap<String, String>;

/// The backend environment every worker invocation carries, so the worker
/// needs no mode logic of its own.
pub fn backend_env(mode: ServiceMode, origin: &str) -> EnvMap {
    EnvMap::from([
        (KEY_MODE.to_string(), mode.as_str().to_string()),
        (KEY_ORIGIN.to_string(), origin.to_string()),
    ])
}

/// The worker program and any fixed leading arguments.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: String,
    pub base_args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }
}

/// Errors from dispatching a worker subprocess.
///
/// These are launch-side failures; a worker that runs and exits nonzero is
/// not an error here, its exit code is the result.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Failed to launch worker {program} for job {job}: {source}")]
    Launch {
        program: String,
        job: String,
        source: std::io::Error,
    },

    #[error("Failed to open log sink {path} for job {job}: {source}")]
    LogSink {
        path: String,
        job: String,
        source: std::io::Error,
    },
}

/// Run the worker for one job and return its exit code unmodified.
///
/// The subprocess is not bounded by a timeout and is not killed if the
/// orchestrator itself is interrupted; once launched it runs to
/// completion or process death. A worker killed by a signal reports `-1`.
pub async fn run_job(
    worker: &WorkerCommand,
    job: &JobSpec,
    params: &ParameterSet,
    env: &EnvMap,
    log_path: &Path,
) -> Result<i32, RunnerError> {
    let log = open_log_sink(log_path, &job.name)?;
    let log_err = log.try_clone().map_err(|e| RunnerError::LogSink {
        path: log_path.display().to_string(),
        job: job.name.clone(),
        source: e,
    })?;

    for diagnostic in params.diagnostics() {
        tracing::warn!(job = %job.name, "Flag conflict: {diagnostic}");
    }

    let args = params.args();
    tracing::info!(
        job = %job.name,
        config = %job.config_path.display(),
        flags = args.len(),
        log = %log_path.display(),
        "Dispatching worker"
    );

    let start = Instant::now();
    let mut cmd = Command::new(&worker.program);
    cmd.args(&worker.base_args)
        .arg("--config")
        .arg(&job.config_path)
        .args(&args)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));

    let status = cmd.status().await.map_err(|e| RunnerError::Launch {
        program: worker.program.clone(),
        job: job.name.clone(),
        source: e,
    })?;

    let exit_code = status.code().unwrap_or(-1);
    let duration_ms = start.elapsed().as_millis() as u64;

    if exit_code == 0 {
        tracing::info!(job = %job.name, duration_ms, "Job finished");
    } else {
        tracing::error!(job = %job.name, exit_code, duration_ms, "Job failed");
    }

    Ok(exit_code)
}

fn open_log_sink(path: &Path, job: &str) -> Result<std::fs::File, RunnerError> {
    let to_err = |source: std::io::Error| RunnerError::LogSink {
        path: path.display().to_string(),
        job: job.to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(to_err)?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
