//! Worker invocation: single-job dispatch and the parallel batch executor.
//!
//! The collection worker is an opaque subprocess; this crate launches it
//! with the flags built by `briefctl-core`, the backend mode/origin in the
//! environment, and stdout/stderr captured into one dedicated log file per
//! job. The batch executor fans jobs out concurrently, joins on all of
//! them, and aggregates per-job exit codes; a failing job never cancels
//! its siblings.

pub mod batch;
pub mod dispatcher;

pub use batch::{run_all, BatchResult, JobOutcome, JobRequest};
pub use dispatcher::{backend_env, run_job, EnvMap, RunnerError, WorkerCommand};
