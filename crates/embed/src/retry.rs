//! Bounded retry with an injected sleeper.
//!
//! [`retry_until`] replaces the usual `for i in 1..N { sleep; try }` loop
//! with a combinator that has no hidden timing side effects: the delay
//! between attempts goes through the [`Sleep`] trait, so tests can count
//! attempts and sleeps without waiting on a real clock.

use std::future::Future;
use std::time::Duration;

/// Injectable delay between retry attempts.
#[async_trait::async_trait]
pub trait Sleep: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `tokio::time::sleep`.
pub struct TokioSleep;

#[async_trait::async_trait]
impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `op` up to `attempts` times, sleeping `interval` between attempts,
/// until it reports success.
///
/// Returns `true` on the first successful attempt, `false` once the
/// attempt budget is exhausted. `attempts == 0` never invokes `op`.
/// No sleep happens after the final attempt.
pub async fn retry_until<S, F, Fut>(
    attempts: u32,
    interval: Duration,
    sleep: &S,
    mut op: F,
) -> bool
where
    S: Sleep + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=attempts {
        if op().await {
            return true;
        }
        if attempt < attempts {
            sleep.sleep(interval).await;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
