//! HTTP readiness probing.
//!
//! A probe polls a health endpoint until it answers with a success status
//! or the attempt budget runs out. A service that is still down is the
//! expected transient state being waited on, so the probe reports
//! [`ProbeStatus::TimedOut`] instead of erroring.
//!
//! Two standard budgets exist: the coarse startup gate applied before
//! running jobs, and the finer-grained gate the mode controller applies
//! right after starting a backend instance.

use std::time::Duration;

use crate::retry::{retry_until, Sleep, TokioSleep};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Startup gate: 12 attempts at 5 s cadence (~60 s wall clock).
pub const STARTUP_GATE_ATTEMPTS: u32 = 12;
pub const STARTUP_GATE_INTERVAL: Duration = Duration::from_secs(5);

/// Mode-switch gate: 10 attempts at 1 s cadence.
pub const SWITCH_GATE_ATTEMPTS: u32 = 10;
pub const SWITCH_GATE_INTERVAL: Duration = Duration::from_secs(1);

/// HTTP timeout for a single probe request.
const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One probe target: URL plus retry budget. Immutable per probe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTarget {
    pub url: String,
    pub retries: u32,
    pub interval: Duration,
}

impl HealthTarget {
    /// Target with the coarse startup budget.
    pub fn startup_gate(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retries: STARTUP_GATE_ATTEMPTS,
            interval: STARTUP_GATE_INTERVAL,
        }
    }

    /// Target with the mode-switch budget.
    pub fn switch_gate(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retries: SWITCH_GATE_ATTEMPTS,
            interval: SWITCH_GATE_INTERVAL,
        }
    }
}

/// Outcome of a bounded probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Ready,
    TimedOut,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Single health-check attempt against a URL.
///
/// A trait so unit tests can script readiness without a network.
#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self, url: &str) -> bool;
}

/// Production transport: HTTP GET, success status means ready.
pub struct HttpHealthCheck {
    client: reqwest::Client,
}

impl HttpHealthCheck {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }
}

impl Default for HttpHealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Prober
// ---------------------------------------------------------------------------

/// Bounded-retry readiness prober over an injected transport and sleeper.
pub struct Prober<C = HttpHealthCheck, S = TokioSleep> {
    check: C,
    sleep: S,
}

impl Prober {
    /// Production prober: HTTP transport, real sleeps.
    pub fn new() -> Self {
        Self {
            check: HttpHealthCheck::new(),
            sleep: TokioSleep,
        }
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HealthCheck, S: Sleep> Prober<C, S> {
    /// Prober with explicit transport and sleeper (used by tests and by
    /// callers that already hold a configured transport).
    pub fn with_parts(check: C, sleep: S) -> Self {
        Self { check, sleep }
    }

    /// Poll `target.url` until it answers healthy or the budget runs out.
    pub async fn probe(&self, target: &HealthTarget) -> ProbeStatus {
        tracing::debug!(url = %target.url, retries = target.retries, "Probing readiness");

        let ready = retry_until(target.retries, target.interval, &self.sleep, || {
            self.check.check(&target.url)
        })
        .await;

        if ready {
            tracing::debug!(url = %target.url, "Endpoint ready");
            ProbeStatus::Ready
        } else {
            tracing::warn!(
                url = %target.url,
                retries = target.retries,
                "Endpoint did not become ready within the probe budget"
            );
            ProbeStatus::TimedOut
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordingSleep, ScriptedCheck};

    #[tokio::test]
    async fn ready_on_third_attempt_within_budget() {
        let prober = Prober::with_parts(ScriptedCheck::ready_on(3), RecordingSleep::new());
        let target = HealthTarget {
            url: "http://127.0.0.1:8080/health".to_string(),
            retries: 10,
            interval: Duration::from_secs(1),
        };
        assert_eq!(prober.probe(&target).await, ProbeStatus::Ready);
        assert_eq!(prober.check.attempt_count(), 3);
    }

    #[tokio::test]
    async fn never_ready_times_out_after_exactly_the_budget() {
        let prober = Prober::with_parts(ScriptedCheck::never_ready(), RecordingSleep::new());
        let target = HealthTarget {
            url: "http://127.0.0.1:8080/health".to_string(),
            retries: 2,
            interval: Duration::from_secs(1),
        };
        assert_eq!(prober.probe(&target).await, ProbeStatus::TimedOut);
        assert_eq!(prober.check.attempt_count(), 2);
    }

    #[tokio::test]
    async fn down_service_is_a_status_not_an_error() {
        // The probe API has no error channel at all; a dead endpoint is
        // simply TimedOut.
        let prober = Prober::with_parts(ScriptedCheck::never_ready(), RecordingSleep::new());
        let status = prober
            .probe(&HealthTarget::switch_gate("http://127.0.0.1:1/health"))
            .await;
        assert_eq!(status, ProbeStatus::TimedOut);
    }

    #[test]
    fn standard_budgets() {
        let startup = HealthTarget::startup_gate("http://gw/healthz");
        assert_eq!(startup.retries, 12);
        assert_eq!(startup.interval, Duration::from_secs(5));

        let switch = HealthTarget::switch_gate("http://embed/health");
        assert_eq!(switch.retries, 10);
        assert_eq!(switch.interval, Duration::from_secs(1));
    }
}
