//! Bounded timeout and retry around generative model calls.
//!
//! Every attempt is wrapped in `tokio::time::timeout`. Retryable failures
//! (timeouts, 429s, transport errors, 5xx) back off exponentially with a
//! little jitter; a 429 carrying `Retry-After` waits that long instead,
//! capped at the per-call timeout.

use std::time::Duration;

use super::{GenerativeModel, LlmError};

/// Timeout and retry settings for one logical model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on a single attempt.
    pub timeout: Duration,
    /// Additional attempts after the first one fails.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_backoff: Duration,
    /// Cap on any single backoff delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            ..Self::default()
        }
    }

    /// No retries; single bounded attempt.
    pub fn no_retry(timeout: Duration) -> Self {
        Self::new(timeout, 0)
    }

    /// Delay before retry number `retry` (0-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    fn delay_for(&self, retry: u32, err: &LlmError) -> Duration {
        if let LlmError::RateLimited {
            retry_after: Some(wait),
        } = err
        {
            return (*wait).min(self.timeout);
        }
        let base = self.backoff(retry);
        // Up to 25% jitter so concurrent requests do not retry in lockstep.
        let jitter_ms = fastrand::u64(0..=base.as_millis() as u64 / 4);
        base + Duration::from_millis(jitter_ms)
    }
}

/// Call `model.generate(prompt)` under `policy`.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once retries are exhausted. A timed-out attempt surfaces as
/// [`LlmError::Timeout`].
pub async fn generate_with_retry(
    model: &dyn GenerativeModel,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<String, LlmError> {
    let mut retry = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, model.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(policy.timeout)),
        };

        let err = match result {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        if !err.is_retryable() || retry >= policy.max_retries {
            return Err(err);
        }

        let wait = policy.delay_for(retry, &err);
        tracing::info!(
            model = model.name(),
            error = %err,
            attempt = retry + 1,
            wait_secs = wait.as_secs_f64(),
            "model call failed, retrying"
        );
        tokio::time::sleep(wait).await;
        retry += 1;
    }
}
