//! Parallel batch execution with fault isolation.
//!
//! Every job is spawned as its own task and every task is joined before
//! the batch returns; a slow job delays the batch's completion signal but
//! a failed job never cancels its siblings. Jobs share nothing — each has
//! its own log sink — so the aggregate result is the only synchronization
//! point. No ordering is guaranteed among concurrently running jobs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use briefctl_core::flags::ParameterSet;
use briefctl_core::types::JobSpec;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::dispatcher::{run_job, EnvMap, WorkerCommand};

/// Everything one job needs: spec, flags, environment, and its dedicated
/// log sink.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job: JobSpec,
    pub params: ParameterSet,
    pub env: EnvMap,
    pub log_path: PathBuf,
}

/// How one job in a batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum JobOutcome {
    /// The worker ran to completion with this exit code.
    Exited { exit_code: i32 },
    /// The worker could not be launched at all.
    LaunchFailed { reason: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited { exit_code: 0 })
    }
}

/// Per-job outcomes plus the aggregate status. Created fresh per batch,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub per_job: BTreeMap<String, JobOutcome>,
    /// Jobs that were requested but never reported an outcome (a worker
    /// task aborted). Normally empty; non-empty forces failure.
    pub unaccounted: Vec<String>,
}

impl BatchResult {
    /// `0` iff every job exited with code 0, else `1`.
    pub fn aggregate_status(&self) -> i32 {
        let all_ok =
            self.unaccounted.is_empty() && self.per_job.values().all(JobOutcome::is_success);
        if all_ok {
            0
        } else {
            1
        }
    }

    /// Names of jobs that did not succeed, in name order.
    pub fn failed_jobs(&self) -> Vec<&str> {
        self.per_job
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Run every requested job concurrently and join on all of them.
///
/// Launch failures are recorded per job instead of aborting the batch, so
/// one unlaunchable worker cannot take down its siblings; the aggregate
/// status still reports failure.
pub async fn run_all(worker: &WorkerCommand, requests: Vec<JobRequest>) -> BatchResult {
    let total = requests.len();
    tracing::info!(jobs = total, "Starting batch");

    let mut tasks: JoinSet<(String, JobOutcome)> = JoinSet::new();
    let mut requested: Vec<String> = Vec::with_capacity(total);

    for request in requests {
        requested.push(request.job.name.clone());
        let worker = worker.clone();
        tasks.spawn(async move {
            let name = request.job.name.clone();
            let outcome = match run_job(
                &worker,
                &request.job,
                &request.params,
                &request.env,
                &request.log_path,
            )
            .await
            {
                Ok(exit_code) => JobOutcome::Exited { exit_code },
                Err(e) => JobOutcome::LaunchFailed {
                    reason: e.to_string(),
                },
            };
            (name, outcome)
        });
    }

    // Full join barrier: collect in completion order until every task is
    // accounted for.
    let mut per_job = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, outcome)) => {
                per_job.insert(name, outcome);
            }
            Err(e) => {
                tracing::error!(error = %e, "Worker task aborted before reporting");
            }
        }
    }

    let unaccounted: Vec<String> = requested
        .into_iter()
        .filter(|name| !per_job.contains_key(name))
        .collect();

    let result = BatchResult {
        per_job,
        unaccounted,
    };
    tracing::info!(
        jobs = total,
        failed = result.failed_jobs().len(),
        aggregate = result.aggregate_status(),
        "Batch finished"
    );
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
