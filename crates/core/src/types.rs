//! Service mode and job registry types.
//!
//! The embedding backend runs in exactly one of two modes at a time; the
//! active mode is persisted in the durable env file under [`KEY_MODE`] and
//! the backend's reachable base URL under [`KEY_ORIGIN`]. Jobs are a fixed
//! registry built once at startup from the configured roots.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Durable env-file key holding the active backend mode.
pub const KEY_MODE: &str = "MODE";

/// Durable env-file key holding the backend base URL.
pub const KEY_ORIGIN: &str = "ORIGIN";

/// Wire value for [`ServiceMode::Local`].
pub const MODE_LOCAL: &str = "local";

/// Wire value for [`ServiceMode::Containerized`].
pub const MODE_CONTAINERIZED: &str = "containerized";

/// All valid mode strings.
pub const VALID_MODES: &[&str] = &[MODE_LOCAL, MODE_CONTAINERIZED];

/// Maximum length of a job name.
const MAX_JOB_NAME_LEN: usize = 128;

// ---------------------------------------------------------------------------
// ServiceMode
// ---------------------------------------------------------------------------

/// Which of the two interchangeable backend deployments is active.
///
/// Exactly one mode runs at a time; both compete for the same network
/// port, so the mode controller stops the other instance before starting
/// the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    Local,
    Containerized,
}

impl ServiceMode {
    /// Parse from the persisted string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            MODE_LOCAL => Ok(Self::Local),
            MODE_CONTAINERIZED => Ok(Self::Containerized),
            _ => Err(CoreError::Validation(format!(
                "Invalid mode '{s}'. Must be one of: {}",
                VALID_MODES.join(", ")
            ))),
        }
    }

    /// The persisted string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => MODE_LOCAL,
            Self::Containerized => MODE_CONTAINERIZED,
        }
    }

    /// The competing mode.
    pub fn other(&self) -> Self {
        match self {
            Self::Local => Self::Containerized,
            Self::Containerized => Self::Local,
        }
    }
}

impl std::fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// One named, independently runnable data-collection task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    /// Registry name; also the log-file and output-directory stem.
    pub name: String,
    /// Source configuration handed to the worker via `--config`.
    pub config_path: PathBuf,
    /// Directory the worker writes its timestamped artifacts into.
    pub output_dir: PathBuf,
}

/// The fixed set of jobs known to this deployment.
///
/// The reference deployment registers three sources; the registry itself
/// accepts any fixed list.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Vec<JobSpec>,
}

/// Source names in the reference deployment.
pub const REFERENCE_SOURCES: &[&str] = &["hackernews", "reddit", "rss"];

impl JobRegistry {
    /// Build a registry from an explicit job list.
    ///
    /// Every job name must pass [`validate_job_name`]; duplicates are
    /// rejected.
    pub fn new(jobs: Vec<JobSpec>) -> Result<Self, CoreError> {
        let mut seen = std::collections::HashSet::with_capacity(jobs.len());
        for job in &jobs {
            validate_job_name(&job.name)?;
            if !seen.insert(job.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate job name: \"{}\"",
                    job.name
                )));
            }
        }
        Ok(Self { jobs })
    }

    /// The reference registry: one job per source under the given roots,
    /// expecting `<configs_dir>/<name>.yaml` and writing to
    /// `<output_root>/<name>/`.
    pub fn reference(configs_dir: &Path, output_root: &Path) -> Self {
        let jobs = REFERENCE_SOURCES
            .iter()
            .map(|name| JobSpec {
                name: (*name).to_string(),
                config_path: configs_dir.join(format!("{name}.yaml")),
                output_dir: output_root.join(name),
            })
            .collect();
        // Reference names are static and already valid.
        Self { jobs }
    }

    /// Look up a job by name.
    pub fn get(&self, name: &str) -> Result<&JobSpec, CoreError> {
        self.jobs
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| CoreError::UnknownJob(name.to_string()))
    }

    /// All jobs, in registration order.
    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    /// All job names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }
}

/// Validate a job name.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_JOB_NAME_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters
///   (job names become log-file stems and subprocess arguments).
pub fn validate_job_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Job name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_JOB_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Job name must not exceed {MAX_JOB_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(
            "Job name may only contain alphanumeric, hyphen, underscore, or dot characters"
                .to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
