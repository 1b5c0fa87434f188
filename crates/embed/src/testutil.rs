//! Shared test doubles for the embed crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::probe::HealthCheck;
use crate::retry::Sleep;

/// No-op sleeper that counts invocations.
pub(crate) struct RecordingSleep {
    pub(crate) sleeps: AtomicU32,
}

impl RecordingSleep {
    pub(crate) fn new() -> Self {
        Self {
            sleeps: AtomicU32::new(0),
        }
    }

    pub(crate) fn count(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Sleep for RecordingSleep {
    async fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

/// Health check that becomes ready on the Nth attempt (never, if
/// `ready_on == 0`) and counts attempts.
pub(crate) struct ScriptedCheck {
    pub(crate) ready_on: u32,
    pub(crate) attempts: AtomicU32,
}

impl ScriptedCheck {
    pub(crate) fn ready_on(attempt: u32) -> Self {
        Self {
            ready_on: attempt,
            attempts: AtomicU32::new(0),
        }
    }

    pub(crate) fn never_ready() -> Self {
        Self::ready_on(0)
    }

    pub(crate) fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HealthCheck for ScriptedCheck {
    async fn check(&self, _url: &str) -> bool {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.ready_on != 0 && n >= self.ready_on
    }
}
