//! Embedding backend control: readiness probing and mode switching.
//!
//! The backend serves the same logical embedding function in one of two
//! runtime modes (local host process or containerized service) that
//! compete for the same network port. This crate owns everything that
//! touches it: the bounded-retry combinator, the HTTP readiness prober,
//! the per-mode start/stop launcher, and the mode controller that ties
//! them together and persists the active mode.

pub mod controller;
pub mod launcher;
pub mod probe;
pub mod retry;

#[cfg(test)]
pub(crate) mod testutil;

pub use controller::{ModeController, ModeOrigins, SwitchError};
pub use launcher::{BackendCommands, BackendLauncher, CommandLauncher, LaunchError};
pub use probe::{HealthCheck, HealthTarget, HttpHealthCheck, Prober, ProbeStatus};
pub use retry::{Sleep, TokioSleep};
