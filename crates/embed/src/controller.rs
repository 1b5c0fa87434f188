//! Mode controller: mutually-exclusive backend mode switching.
//!
//! Both backend instances compete for the same network port, so the
//! controller always stops the competing instance before starting the
//! requested one; without that ordering both can hold the port at once and
//! health probes turn non-deterministic. Every step is idempotent, a
//! failed switch can simply be re-run.
//!
//! Sequence: acquire advisory lock → stop other → start requested →
//! probe readiness → persist `MODE`/`ORIGIN` atomically. Concurrent
//! switches from separate invocations are excluded by a create-new lock
//! file released on drop; a lock left behind by a process that died
//! mid-switch is detected via pid liveness and reclaimed, so a crash
//! never wedges later switches.

use std::path::{Path, PathBuf};

use briefctl_core::envfile::{self, EnvFileError};
use briefctl_core::types::{ServiceMode, KEY_MODE, KEY_ORIGIN};

use crate::launcher::{BackendLauncher, LaunchError};
use crate::probe::{HealthCheck, HealthTarget, HttpHealthCheck, ProbeStatus, Prober};
use crate::retry::{Sleep, TokioSleep};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from a mode switch. Readiness timeouts surface here with a
/// reason; the caller may retry `switch_to`, whose first step will again
/// stop whatever is running.
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error("Another mode switch is in progress (lock file {0} exists)")]
    Busy(String),

    #[error("Lock file I/O failed: {0}")]
    LockIo(std::io::Error),

    #[error("{mode} backend did not become healthy at {url}")]
    NotHealthy { mode: ServiceMode, url: String },

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Config(#[from] EnvFileError),
}

// ---------------------------------------------------------------------------
// Origins
// ---------------------------------------------------------------------------

/// Base URLs the backend is reachable at, per mode.
#[derive(Debug, Clone)]
pub struct ModeOrigins {
    pub local: String,
    pub containerized: String,
}

impl ModeOrigins {
    pub fn origin(&self, mode: ServiceMode) -> &str {
        match mode {
            ServiceMode::Local => &self.local,
            ServiceMode::Containerized => &self.containerized,
        }
    }

    /// Health endpoint for a mode's origin.
    pub fn health_url(&self, mode: ServiceMode) -> String {
        format!("{}/health", self.origin(mode).trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Advisory lock
// ---------------------------------------------------------------------------

/// Create-new lock file released on drop.
///
/// The holder's pid is written into the file; `acquire` reclaims a lock
/// whose holder is no longer alive, so a switch killed mid-flight does
/// not block every later one.
struct SwitchLock {
    path: PathBuf,
}

impl SwitchLock {
    fn acquire(path: &Path) -> Result<Self, SwitchError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(SwitchError::LockIo)?;
            }
        }
        match Self::try_create(path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if Self::holder_alive(path) {
                    return Err(SwitchError::Busy(path.display().to_string()));
                }
                tracing::warn!(path = %path.display(), "Reclaiming switch lock left by a dead process");
                match std::fs::remove_file(path) {
                    Ok(()) => {}
                    // Another contender already reclaimed it.
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(SwitchError::LockIo(e)),
                }
                match Self::try_create(path) {
                    Ok(lock) => Ok(lock),
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                        Err(SwitchError::Busy(path.display().to_string()))
                    }
                    Err(e) => Err(SwitchError::LockIo(e)),
                }
            }
            Err(e) => Err(SwitchError::LockIo(e)),
        }
    }

    fn try_create(path: &Path) -> std::io::Result<Self> {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        write!(file, "{}", std::process::id())?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// A live holder always wrote its own pid into the lock; a missing or
    /// unparseable pid means the holder died before finishing the write,
    /// a parseable one is checked against the process table.
    fn holder_alive(path: &Path) -> bool {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return false;
        };
        match contents.trim().parse::<u32>() {
            Ok(pid) => Path::new("/proc").join(pid.to_string()).exists(),
            Err(_) => false,
        }
    }
}

impl Drop for SwitchLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove switch lock file");
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Switches the embedding backend between its two runtime modes.
pub struct ModeController<L, C = HttpHealthCheck, S = TokioSleep> {
    launcher: L,
    prober: Prober<C, S>,
    origins: ModeOrigins,
    env_file: PathBuf,
    lock_path: PathBuf,
}

impl<L: BackendLauncher> ModeController<L> {
    /// Controller with the production prober. The lock file lives next to
    /// the durable env file.
    pub fn new(launcher: L, origins: ModeOrigins, env_file: PathBuf) -> Self {
        let lock_path = env_file.with_extension("switch.lock");
        Self {
            launcher,
            prober: Prober::new(),
            origins,
            env_file,
            lock_path,
        }
    }
}

impl<L, C, S> ModeController<L, C, S>
where
    L: BackendLauncher,
    C: HealthCheck,
    S: Sleep,
{
    /// Controller with explicit prober parts and lock path.
    pub fn with_parts(
        launcher: L,
        prober: Prober<C, S>,
        origins: ModeOrigins,
        env_file: PathBuf,
        lock_path: PathBuf,
    ) -> Self {
        Self {
            launcher,
            prober,
            origins,
            env_file,
            lock_path,
        }
    }

    /// Switch the backend to `mode` and persist it.
    ///
    /// Safe to re-run after any failure: stopping an already-stopped
    /// instance is tolerated, starting is idempotent at the service level,
    /// and persistence happens last.
    pub async fn switch_to(&self, mode: ServiceMode) -> Result<(), SwitchError> {
        let _lock = SwitchLock::acquire(&self.lock_path)?;

        let other = mode.other();
        tracing::info!(target_mode = %mode, "Switching backend mode");

        // Stop the competing instance first; both modes want the same
        // port. Best-effort: nothing running is fine.
        if let Err(e) = self.launcher.stop(other).await {
            tracing::warn!(mode = %other, error = %e, "Stopping competing backend failed; continuing");
        }

        self.launcher.start(mode).await?;

        // Both modes block on the same readiness gate; a containerized
        // start that never answers is surfaced just like a local one.
        let health_url = self.origins.health_url(mode);
        let target = HealthTarget::switch_gate(health_url.clone());
        if self.prober.probe(&target).await == ProbeStatus::TimedOut {
            return Err(SwitchError::NotHealthy {
                mode,
                url: health_url,
            });
        }

        envfile::update_keys(
            &self.env_file,
            &[(KEY_MODE, mode.as_str()), (KEY_ORIGIN, self.origins.origin(mode))],
        )?;

        tracing::info!(mode = %mode, origin = self.origins.origin(mode), "Backend mode persisted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
