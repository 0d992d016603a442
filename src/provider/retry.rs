// src/provider/retry.rs — Backoff wrapper around any ModelProvider
//
// Transient failures (429, 5xx, timeouts, dropped connections) are retried
// with exponential backoff. Everything else goes straight back to the step.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider};
use crate::infra::config::RetrySettings;
use crate::infra::errors::DesignError;

/// Padding added on top of a server-supplied `retry-after`.
const RETRY_AFTER_PAD: Duration = Duration::from_millis(100);

/// How long to wait between attempts and how many attempts to make.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub base: Duration,
    pub ceiling: Duration,
    pub multiplier: f64,
    /// Jitter spread as a fraction of the delay, `0.0` disables it.
    pub spread: f64,
}

impl From<&RetrySettings> for BackoffPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base: Duration::from_millis(settings.initial_delay_ms),
            ceiling: Duration::from_millis(settings.max_delay_ms),
            multiplier: 2.0,
            spread: 0.2,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-indexed).
    ///
    /// A rate-limit hint from the server wins over the computed curve.
    pub fn delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint + RETRY_AFTER_PAD;
        }
        let curve_ms = self.base.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped_ms = curve_ms.min(self.ceiling.as_millis() as f64);
        let jittered_ms = (capped_ms * jitter(attempt, self.spread)).round().max(1.0);
        Duration::from_millis(jittered_ms as u64)
    }

    fn allows(&self, attempt: u32, error: &DesignError) -> bool {
        error.is_retriable() && attempt < self.max_retries
    }
}

/// Server-supplied wait, when the error carries one.
fn retry_after(error: &DesignError) -> Option<Duration> {
    match error {
        DesignError::RateLimited { retry_after_ms, .. } if *retry_after_ms > 0 => {
            Some(Duration::from_millis(*retry_after_ms))
        }
        _ => None,
    }
}

/// Multiplier in `[1 - spread, 1 + spread]`, fixed per attempt so runs are reproducible.
fn jitter(attempt: u32, spread: f64) -> f64 {
    let unit = f64::from(attempt.wrapping_mul(2_654_435_761)) / f64::from(u32::MAX);
    1.0 + spread * (2.0 * unit - 1.0)
}

/// Wraps a provider and retries `chat()` according to a [`BackoffPolicy`].
pub struct RetryProvider {
    inner: Arc<dyn ModelProvider>,
    policy: BackoffPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn ModelProvider>, policy: BackoffPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ModelProvider for RetryProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DesignError> {
        let mut attempt = 0;
        loop {
            let err = match self.inner.chat(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };
            if !self.policy.allows(attempt, &err) {
                return Err(err);
            }

            let wait = self.policy.delay(attempt, retry_after(&err));
            tracing::warn!(
                provider = self.inner.id(),
                model = %request.model,
                attempt = attempt + 1,
                of = self.policy.max_retries,
                wait_ms = wait.as_millis() as u64,
                "backend call failed, retrying: {err}"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}
