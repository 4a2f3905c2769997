//! Retrying decorator for the generation gateway.
//!
//! Transient gateway failures are retried with capped exponential backoff.
//! Story use cases never retry on their own; their per-call deadline bounds
//! the total time spent here.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay randomly added or removed, 0.0 to 1.0
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 400,
            max_delay_ms: 5_000,
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
        let millis = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(millis)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return delay;
        }
        let spread = delay.as_secs_f64() * self.jitter_factor.min(1.0);
        let offset = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_secs_f64((delay.as_secs_f64() + offset).max(0.0))
    }
}

pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    config: RetryConfig,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut retry = 0;
        loop {
            let err = match self.inner.generate(request.clone()).await {
                Ok(response) => {
                    if retry > 0 {
                        tracing::info!(retries = retry, "Generation succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                tracing::error!(error = %err, "Generation rejected, not retrying");
                return Err(err);
            }
            if retry >= self.config.max_retries {
                tracing::error!(
                    attempts = retry + 1,
                    error = %err,
                    "Generation failed on every attempt"
                );
                return Err(err);
            }

            retry += 1;
            let delay = self.config.jittered(self.config.backoff(retry));
            tracing::warn!(
                retry,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Generation failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Gateway that fails with `error` for the first `failures` calls.
    struct FlakyLlm {
        failures: u32,
        error: LlmError,
        calls: AtomicU32,
    }

    impl FlakyLlm {
        fn new(failures: u32, error: LlmError) -> Arc<Self> {
            Arc::new(Self {
                failures,
                error,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmPort for FlakyLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(LlmResponse::text(r#"{"content":"The tide turns."}"#))
            }
        }
    }

    fn quick(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 4,
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let flaky = FlakyLlm::new(2, LlmError::RequestFailed("connection reset".into()));
        let client = ResilientLlmClient::new(flaky.clone(), quick(3));

        let response = client.generate(LlmRequest::new(vec![])).await.unwrap();

        assert_eq!(response.content, r#"{"content":"The tide turns."}"#);
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_configured_retries() {
        let flaky = FlakyLlm::new(10, LlmError::InvalidResponse("not json".into()));
        let client = ResilientLlmClient::new(flaky.clone(), quick(2));

        let result = client.generate(LlmRequest::new(vec![])).await;

        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn rejections_are_attempted_once() {
        let flaky = FlakyLlm::new(
            10,
            LlmError::Rejected {
                status: 404,
                message: "model not found".into(),
            },
        );
        let client = ResilientLlmClient::new(flaky.clone(), quick(3));

        assert!(client.generate(LlmRequest::new(vec![])).await.is_err());
        assert_eq!(flaky.calls(), 1);
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let config = RetryConfig {
            max_retries: 6,
            base_delay_ms: 400,
            max_delay_ms: 5_000,
            jitter_factor: 0.0,
        };

        assert_eq!(config.backoff(1), Duration::from_millis(400));
        assert_eq!(config.backoff(2), Duration::from_millis(800));
        assert_eq!(config.backoff(4), Duration::from_millis(3_200));
        assert_eq!(config.backoff(5), Duration::from_millis(5_000));
        assert_eq!(config.backoff(80), Duration::from_millis(5_000));
    }

    #[test]
    fn jitter_stays_within_spread() {
        let config = RetryConfig::default();
        let base = Duration::from_millis(1_000);
        for _ in 0..50 {
            let delay = config.jittered(base);
            assert!(delay >= Duration::from_millis(749) && delay <= Duration::from_millis(1_251));
        }
    }
}
