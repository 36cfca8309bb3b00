use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use abridge_core::compressor::{Compression, Compressor};
use abridge_core::errors::CompressError;

/// Retry behavior for the ReliableCompressor wrapper.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.2,
        }
    }
}

/// Wraps a Compressor with bounded retries of transient failures.
///
/// - Transient errors retry with exponential backoff + jitter
/// - `retry_after` hints from rate limit responses are respected
/// - Fatal errors and exhausted budgets propagate unchanged; the engine
///   downstream never silently skips a failed condensation
pub struct ReliableCompressor<C: Compressor> {
    inner: C,
    config: RetryConfig,
    total_retries: Arc<AtomicU64>,
}

impl<C: Compressor> ReliableCompressor<C> {
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            total_retries: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_defaults(inner: C) -> Self {
        Self::new(inner, RetryConfig::default())
    }

    /// Calculate delay for a retry attempt using exponential backoff + jitter.
    fn retry_delay(&self, attempt: u32, suggested: Option<Duration>) -> Duration {
        // Respect server-suggested delay if provided
        if let Some(delay) = suggested {
            return delay;
        }

        let exp_delay = self.config.base_delay.as_millis() as f64 * 2.0_f64.powi(attempt as i32);
        let capped = exp_delay.min(self.config.max_delay.as_millis() as f64);

        let jitter_range = capped * self.config.jitter_factor;
        let jitter = (random_u64() % (jitter_range as u64 * 2 + 1)) as f64 - jitter_range;
        let final_ms = (capped + jitter).max(100.0);

        Duration::from_millis(final_ms as u64)
    }

    pub fn total_retries(&self) -> u64 {
        self.total_retries.load(Ordering::Relaxed)
    }
}

/// Simple non-cryptographic random u64 using thread-local xorshift state.
fn random_u64() -> u64 {
    use std::cell::Cell;
    use std::time::SystemTime;

    thread_local! {
        static STATE: Cell<u64> = Cell::new(
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as u64
                | 1
        );
    }

    STATE.with(|s| {
        let mut x = s.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        s.set(x);
        x
    })
}

#[async_trait]
impl<C: Compressor> Compressor for ReliableCompressor<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn compress(&self, prompt: &str) -> Result<Compression, CompressError> {
        let mut last_error: Option<CompressError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.compress(prompt).await {
                Ok(compression) => return Ok(compression),
                Err(e) => {
                    if e.is_fatal() || attempt == self.config.max_retries {
                        return Err(e);
                    }

                    let delay = self.retry_delay(attempt, e.suggested_delay());
                    self.total_retries.fetch_add(1, Ordering::Relaxed);

                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        kind = e.error_kind(),
                        error = %e,
                        "retrying compressor call after transient error"
                    );

                    last_error = Some(e);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error.unwrap_or(CompressError::Network("max retries exceeded".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCompressor, MockResponse};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn success_on_first_try() {
        let mock = MockCompressor::new(vec![MockResponse::text("ok")]);
        let reliable = ReliableCompressor::new(mock, fast_config());
        let out = reliable.compress("input").await.unwrap();
        assert_eq!(out.text, "ok");
        assert_eq!(reliable.total_retries(), 0);
    }

    #[tokio::test]
    async fn retries_transient_then_recovers() {
        let mock = MockCompressor::new(vec![
            MockResponse::Error(CompressError::ServerError {
                status: 500,
                body: "internal".into(),
            }),
            MockResponse::Error(CompressError::EmptyResponse),
            MockResponse::text("recovered"),
        ]);
        let reliable = ReliableCompressor::new(mock, fast_config());
        let out = reliable.compress("input").await.unwrap();
        assert_eq!(out.text, "recovered");
        assert_eq!(reliable.total_retries(), 2);
    }

    #[tokio::test]
    async fn fatal_error_not_retried() {
        let mock = MockCompressor::new(vec![
            MockResponse::Error(CompressError::AuthenticationFailed("bad key".into())),
            MockResponse::text("unreachable"),
        ]);
        let reliable = ReliableCompressor::new(mock, fast_config());
        let err = reliable.compress("input").await.unwrap_err();
        assert!(matches!(err, CompressError::AuthenticationFailed(_)));
        assert_eq!(reliable.total_retries(), 0);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let responses = (0..4)
            .map(|i| {
                MockResponse::Error(CompressError::ServerError {
                    status: 500,
                    body: format!("fail {i}"),
                })
            })
            .collect();
        let reliable = ReliableCompressor::new(MockCompressor::new(responses), fast_config());
        let err = reliable.compress("input").await.unwrap_err();
        assert!(matches!(err, CompressError::ServerError { .. }));
        assert_eq!(reliable.total_retries(), 3);
    }

    #[tokio::test]
    async fn retry_delay_respects_suggested() {
        let reliable =
            ReliableCompressor::new(MockCompressor::new(vec![]), RetryConfig::default());
        let delay = reliable.retry_delay(0, Some(Duration::from_secs(7)));
        assert_eq!(delay, Duration::from_secs(7));
    }

    #[tokio::test]
    async fn retry_delay_exponential_and_capped() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter_factor: 0.0,
        };
        let reliable = ReliableCompressor::new(MockCompressor::new(vec![]), config);
        assert_eq!(reliable.retry_delay(0, None).as_millis(), 200);
        assert_eq!(reliable.retry_delay(1, None).as_millis(), 400);
        assert_eq!(reliable.retry_delay(2, None).as_millis(), 800);
        // 200ms * 2^10 >> 5s cap
        assert_eq!(reliable.retry_delay(10, None).as_millis(), 5000);
    }
}
