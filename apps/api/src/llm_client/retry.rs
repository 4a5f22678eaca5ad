use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{CompletionService, ModelResponse, UpstreamError};

/// How many times a failed call is repeated, and the first backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Exponential backoff: base, 2×base, 4×base, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

/// Decorator that retries retryable [`UpstreamError`]s of the wrapped service.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: CompletionService> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C: CompletionService> CompletionService for RetryingClient<C> {
    async fn evaluate(&self, prompt: &str, system: &str) -> Result<ModelResponse, UpstreamError> {
        let mut retry = 0;
        loop {
            match self.inner.evaluate(prompt, system).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retry < self.policy.max_retries => {
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    warn!(
                        "Completion attempt {} failed (status {:?}: {e}), retrying after {}ms...",
                        retry,
                        e.status_code(),
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
