//! Subcommand implementations.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};

use briefctl_core::envfile;
use briefctl_core::flags::ParameterSet;
use briefctl_core::outputs;
use briefctl_core::types::{JobRegistry, ServiceMode, KEY_MODE, KEY_ORIGIN};
use briefctl_embed::{
    BackendCommands, CommandLauncher, HealthTarget, ModeController, ModeOrigins, ProbeStatus,
    Prober,
};
use briefctl_runner::{backend_env, run_all, run_job, BatchResult, JobOutcome, JobRequest, WorkerCommand};

use crate::config::OrchestratorConfig;

/// Run one registered job. Returns the process exit status (0/1).
pub async fn run_single(
    cfg: &OrchestratorConfig,
    job_name: &str,
    params: ParameterSet,
    json: bool,
) -> Result<i32> {
    let registry = registry(cfg);
    let job = registry.get(job_name)?.clone();

    let (mode, origin) = backend_context(cfg)?;
    gate_on_dependencies(cfg, &origin).await?;

    let log_path = cfg.logs_dir.join(format!("{}.log", job.name));
    let exit_code = run_job(
        &worker(cfg),
        &job,
        &params,
        &backend_env(mode, &origin),
        &log_path,
    )
    .await
    .context("failed to launch the collection worker")?;

    let mut per_job = BTreeMap::new();
    per_job.insert(job.name.clone(), JobOutcome::Exited { exit_code });
    let result = BatchResult {
        per_job,
        unaccounted: Vec::new(),
    };
    print_summary(&result, json)?;
    Ok(result.aggregate_status())
}

/// Run every registered job concurrently. Returns the aggregate status.
pub async fn run_batch(cfg: &OrchestratorConfig, params: ParameterSet, json: bool) -> Result<i32> {
    let registry = registry(cfg);

    let (mode, origin) = backend_context(cfg)?;
    gate_on_dependencies(cfg, &origin).await?;

    let env = backend_env(mode, &origin);
    let requests: Vec<JobRequest> = registry
        .jobs()
        .iter()
        .map(|job| JobRequest {
            job: job.clone(),
            params: params.clone(),
            env: env.clone(),
            log_path: cfg.logs_dir.join(format!("{}.log", job.name)),
        })
        .collect();

    let result = run_all(&worker(cfg), requests).await;
    print_summary(&result, json)?;
    Ok(result.aggregate_status())
}

/// Switch the embedding backend mode and persist it.
pub async fn switch_mode(cfg: &OrchestratorConfig, mode_str: &str) -> Result<()> {
    let mode = ServiceMode::from_str_value(mode_str)?;

    let commands =
        BackendCommands::reference(&cfg.compose_service, &cfg.local_server, &cfg.logs_dir);
    let launcher = CommandLauncher::new(commands);
    let controller = ModeController::new(launcher, origins(cfg), cfg.env_file.clone());

    controller.switch_to(mode).await?;
    println!("backend mode is now {mode} ({})", origins(cfg).origin(mode));
    Ok(())
}

/// Print the newest artifact path for a job, or an explicit "no output
/// yet" message.
pub fn show_latest(cfg: &OrchestratorConfig, job_name: &str) -> Result<()> {
    let registry = registry(cfg);
    let job = registry.get(job_name)?;

    match outputs::latest_artifact(&job.output_dir) {
        Some(path) => println!("{}", path.display()),
        None => println!("no output yet for job {job_name}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry(cfg: &OrchestratorConfig) -> JobRegistry {
    JobRegistry::reference(&cfg.configs_dir, &cfg.output_root)
}

fn worker(cfg: &OrchestratorConfig) -> WorkerCommand {
    WorkerCommand::new(cfg.worker_program.clone())
}

fn origins(cfg: &OrchestratorConfig) -> ModeOrigins {
    ModeOrigins {
        local: cfg.local_origin.clone(),
        containerized: cfg.container_origin.clone(),
    }
}

/// Read the persisted backend mode and origin; workers never carry their
/// own mode logic, so a missing pair is an operator error.
fn backend_context(cfg: &OrchestratorConfig) -> Result<(ServiceMode, String)> {
    let mode = envfile::read_key(&cfg.env_file, KEY_MODE)
        .with_context(|| format!("failed to read {}", cfg.env_file.display()))?;
    let origin = envfile::read_key(&cfg.env_file, KEY_ORIGIN)?;

    match (mode, origin) {
        (Some(mode), Some(origin)) => Ok((ServiceMode::from_str_value(&mode)?, origin)),
        _ => bail!(
            "no backend mode persisted in {}; run `briefctl mode <local|containerized>` first",
            cfg.env_file.display()
        ),
    }
}

/// Startup health gate: the feed gateway and the embedding backend must
/// both answer before any job is dispatched.
async fn gate_on_dependencies(cfg: &OrchestratorConfig, embed_origin: &str) -> Result<()> {
    let prober = Prober::new();

    let gateway = HealthTarget::startup_gate(cfg.gateway_health_url());
    if prober.probe(&gateway).await == ProbeStatus::TimedOut {
        bail!("feed gateway at {} did not become ready", gateway.url);
    }

    let embed = HealthTarget::startup_gate(format!(
        "{}/health",
        embed_origin.trim_end_matches('/')
    ));
    if prober.probe(&embed).await == ProbeStatus::TimedOut {
        bail!(
            "embedding backend at {} did not become ready; check `briefctl mode`",
            embed.url
        );
    }

    Ok(())
}

/// The summary is printed unconditionally, success or failure.
fn print_summary(result: &BatchResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for (name, outcome) in &result.per_job {
        match outcome {
            JobOutcome::Exited { exit_code: 0 } => println!("{name}: ok"),
            JobOutcome::Exited { exit_code } => println!("{name}: failed (exit {exit_code})"),
            JobOutcome::LaunchFailed { reason } => println!("{name}: launch failed ({reason})"),
        }
    }
    for name in &result.unaccounted {
        println!("{name}: no outcome reported");
    }
    println!("aggregate: {}", result.aggregate_status());
    Ok(())
}
