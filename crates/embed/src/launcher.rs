//! Backend instance start/stop per service mode.
//!
//! The containerized instance is driven through `docker compose`; the
//! local instance is a host process spawned detached with its output
//! redirected to a log file, and stopped best-effort via `pkill`.
//! Stopping an instance that is not running is not an error, the mode
//! controller relies on that to make every switch step re-runnable.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use briefctl_core::types::ServiceMode;
use tokio::process::Command;

/// Timeout for a run-to-completion control command (`docker compose`,
/// `pkill`).
const CONTROL_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from starting or stopping a backend instance.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with code {exit_code:?}: {stderr}")]
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("Failed to open backend log file {path}: {source}")]
    LogFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Empty command line configured for {what}")]
    EmptyCommand { what: &'static str },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Command lines used to control the backend in each mode.
#[derive(Debug, Clone)]
pub struct BackendCommands {
    /// Run to completion to start the containerized instance.
    pub container_start: Vec<String>,
    /// Run to completion to stop the containerized instance.
    pub container_stop: Vec<String>,
    /// Spawned detached to start the local instance.
    pub local_start: Vec<String>,
    /// Run to completion to stop the local instance; a "no such process"
    /// result is tolerated.
    pub local_stop: Vec<String>,
    /// Log file the detached local instance writes to.
    pub local_log: PathBuf,
}

impl BackendCommands {
    /// Reference command set: a compose service for the containerized
    /// mode, a single-binary server for the local mode.
    pub fn reference(compose_service: &str, local_server: &str, logs_dir: &Path) -> Self {
        let compose = |verb: &str| -> Vec<String> {
            let mut cmd: Vec<String> = vec!["docker".into(), "compose".into(), verb.into()];
            if verb == "up" {
                cmd.push("-d".into());
            }
            cmd.push(compose_service.into());
            cmd
        };
        Self {
            container_start: compose("up"),
            container_stop: compose("stop"),
            local_start: vec![local_server.into()],
            local_stop: vec!["pkill".into(), "-f".into(), local_server.into()],
            local_log: logs_dir.join("embed-local.log"),
        }
    }
}

// ---------------------------------------------------------------------------
// Launcher
// ---------------------------------------------------------------------------

/// Start/stop surface for the two backend instances.
///
/// A trait so the mode controller can be tested against a scripted
/// launcher instead of real processes.
#[async_trait::async_trait]
pub trait BackendLauncher: Send + Sync {
    async fn start(&self, mode: ServiceMode) -> Result<(), LaunchError>;
    async fn stop(&self, mode: ServiceMode) -> Result<(), LaunchError>;
}

/// Production launcher shelling out to the configured command lines.
pub struct CommandLauncher {
    commands: BackendCommands,
}

impl CommandLauncher {
    pub fn new(commands: BackendCommands) -> Self {
        Self { commands }
    }

    /// Run a control command to completion under a timeout and require a
    /// zero exit code.
    async fn run_checked(&self, cmdline: &[String], what: &'static str) -> Result<(), LaunchError> {
        let (program, args) = split_cmdline(cmdline, what)?;

        tracing::info!(program, ?args, "Running backend control command");

        let result = tokio::time::timeout(
            CONTROL_COMMAND_TIMEOUT,
            Command::new(program).args(args).output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(LaunchError::CommandFailed {
                program: program.to_string(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            Ok(Err(e)) => Err(LaunchError::Spawn {
                program: program.to_string(),
                source: e,
            }),
            Err(_) => Err(LaunchError::Timeout {
                program: program.to_string(),
                timeout_secs: CONTROL_COMMAND_TIMEOUT.as_secs(),
            }),
        }
    }

    /// Spawn the local server detached, stdout/stderr appended to its log
    /// file. The child is intentionally not killed on drop; it outlives
    /// the orchestrator invocation.
    fn spawn_local(&self) -> Result<(), LaunchError> {
        let (program, args) = split_cmdline(&self.commands.local_start, "local_start")?;

        if let Some(parent) = self.commands.local_log.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LaunchError::LogFile {
                path: self.commands.local_log.display().to_string(),
                source: e,
            })?;
        }
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.commands.local_log)
            .map_err(|e| LaunchError::LogFile {
                path: self.commands.local_log.display().to_string(),
                source: e,
            })?;
        let log_err = log.try_clone().map_err(|e| LaunchError::LogFile {
            path: self.commands.local_log.display().to_string(),
            source: e,
        })?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        tracing::info!(
            program,
            pid = child.id(),
            log = %self.commands.local_log.display(),
            "Local backend spawned"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl BackendLauncher for CommandLauncher {
    async fn start(&self, mode: ServiceMode) -> Result<(), LaunchError> {
        match mode {
            ServiceMode::Containerized => {
                self.run_checked(&self.commands.container_start, "container_start")
                    .await
            }
            ServiceMode::Local => self.spawn_local(),
        }
    }

    async fn stop(&self, mode: ServiceMode) -> Result<(), LaunchError> {
        match mode {
            ServiceMode::Containerized => {
                self.run_checked(&self.commands.container_stop, "container_stop")
                    .await
            }
            ServiceMode::Local => {
                // pkill exits 1 when nothing matched; nothing running is
                // exactly the state a stop wants.
                match self
                    .run_checked(&self.commands.local_stop, "local_stop")
                    .await
                {
                    Err(LaunchError::CommandFailed { exit_code: Some(1), .. }) => {
                        tracing::info!(mode = %mode, "No local backend instance to stop");
                        Ok(())
                    }
                    other => other,
                }
            }
        }
    }
}

fn split_cmdline<'a>(
    cmdline: &'a [String],
    what: &'static str,
) -> Result<(&'a str, &'a [String]), LaunchError> {
    match cmdline.split_first() {
        Some((program, args)) => Ok((program.as_str(), args)),
        None => Err(LaunchError::EmptyCommand { what }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn true_commands(dir: &Path) -> BackendCommands {
        BackendCommands {
            container_start: vec!["true".into()],
            container_stop: vec!["true".into()],
            local_start: vec!["true".into()],
            local_stop: vec!["true".into()],
            local_log: dir.join("embed-local.log"),
        }
    }

    #[test]
    fn reference_commands_shape() {
        let cmds = BackendCommands::reference("embed", "embed-server", Path::new("/var/log/briefctl"));
        assert_eq!(
            cmds.container_start,
            vec!["docker", "compose", "up", "-d", "embed"]
        );
        assert_eq!(cmds.container_stop, vec!["docker", "compose", "stop", "embed"]);
        assert_eq!(cmds.local_stop, vec!["pkill", "-f", "embed-server"]);
        assert_eq!(
            cmds.local_log,
            PathBuf::from("/var/log/briefctl/embed-local.log")
        );
    }

    #[tokio::test]
    async fn successful_control_command_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = CommandLauncher::new(true_commands(dir.path()));
        assert!(launcher.start(ServiceMode::Containerized).await.is_ok());
        assert!(launcher.stop(ServiceMode::Containerized).await.is_ok());
    }

    #[tokio::test]
    async fn failing_control_command_reports_exit_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmds = true_commands(dir.path());
        cmds.container_start = vec![
            "sh".into(),
            "-c".into(),
            "echo compose broke >&2; exit 3".into(),
        ];
        let launcher = CommandLauncher::new(cmds);
        let err = launcher.start(ServiceMode::Containerized).await.unwrap_err();
        assert_matches!(
            err,
            LaunchError::CommandFailed {
                exit_code: Some(3),
                ref stderr,
                ..
            } if stderr == "compose broke"
        );
    }

    #[tokio::test]
    async fn stopping_an_absent_local_instance_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmds = true_commands(dir.path());
        // pkill with no match exits 1.
        cmds.local_stop = vec!["sh".into(), "-c".into(), "exit 1".into()];
        let launcher = CommandLauncher::new(cmds);
        assert!(launcher.stop(ServiceMode::Local).await.is_ok());
    }

    #[tokio::test]
    async fn local_start_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmds = true_commands(dir.path());
        cmds.local_start = vec!["sh".into(), "-c".into(), "echo booting".into()];
        let launcher = CommandLauncher::new(cmds.clone());
        launcher.start(ServiceMode::Local).await.unwrap();
        assert!(cmds.local_log.exists());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmds = true_commands(dir.path());
        cmds.container_start = vec!["briefctl-no-such-binary".into()];
        let launcher = CommandLauncher::new(cmds);
        assert_matches!(
            launcher.start(ServiceMode::Containerized).await,
            Err(LaunchError::Spawn { .. })
        );
    }

    #[tokio::test]
    async fn empty_command_line_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmds = true_commands(dir.path());
        cmds.container_stop = vec![];
        let launcher = CommandLauncher::new(cmds);
        assert_matches!(
            launcher.stop(ServiceMode::Containerized).await,
            Err(LaunchError::EmptyCommand { .. })
        );
    }
}
