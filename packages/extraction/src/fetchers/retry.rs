//! Retrying fetcher wrapper.
//!
//! The pipeline itself never retries. Callers that want retries wrap their
//! fetcher here: transient failures (timeouts, dropped connections, 5xx)
//! are retried with exponential backoff, everything else fails at once.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::error::FetchResult;
use crate::traits::fetcher::Fetcher;
use crate::types::{config::RunConfig, page::RawPage};

/// A fetcher wrapper that retries transient errors.
pub struct RetryingFetcher<F: Fetcher> {
    inner: F,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl<F: Fetcher> RetryingFetcher<F> {
    /// Wrap a fetcher.
    ///
    /// # Arguments
    /// * `fetcher` - The underlying fetcher to wrap
    /// * `max_retries` - Attempts after the first one (0 = no retry)
    pub fn new(fetcher: F, max_retries: u32) -> Self {
        Self {
            inner: fetcher,
            max_retries,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Set the first backoff; each retry doubles it up to the maximum.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RetryingFetcher<F> {
    async fn fetch(&self, url: &str, config: &RunConfig) -> FetchResult<RawPage> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch(url, config).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let backoff = self.backoff_for(attempt);
                    attempt += 1;
                    warn!(
                        url = %url,
                        error = %e,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Retrying fetch"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn prepare(&self, config: &RunConfig) -> FetchResult<()> {
        self.inner.prepare(config)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for easy retry wrapping.
pub trait FetcherExt: Fetcher + Sized {
    /// Wrap this fetcher with bounded retries.
    fn with_retries(self, max_retries: u32) -> RetryingFetcher<Self> {
        RetryingFetcher::new(self, max_retries)
    }
}

impl<F: Fetcher + Sized> FetcherExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::testing::{sample_config, MockFetcher};

    const URL: &str = "https://example.com/vacancies";

    fn quick(fetcher: MockFetcher, retries: u32) -> RetryingFetcher<MockFetcher> {
        fetcher
            .with_retries(retries)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let mock = MockFetcher::new()
            .with_failure(URL, FetchError::Timeout { url: URL.into() })
            .with_failure(URL, FetchError::Status { url: URL.into(), status: 502 })
            .with_page(URL, "<html></html>");
        let fetcher = quick(mock.clone(), 3);

        let page = fetcher.fetch(URL, &sample_config(&[URL])).await.unwrap();
        assert_eq!(page.url, URL);
        assert_eq!(mock.call_count(URL), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mock = MockFetcher::new()
            .with_failure(URL, FetchError::Timeout { url: URL.into() })
            .with_failure(URL, FetchError::Timeout { url: URL.into() })
            .with_page(URL, "<html></html>");
        let fetcher = quick(mock.clone(), 1);

        let err = fetcher.fetch(URL, &sample_config(&[URL])).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
        assert_eq!(mock.call_count(URL), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let mock = MockFetcher::new()
            .with_failure(URL, FetchError::Status { url: URL.into(), status: 404 })
            .with_page(URL, "<html></html>");
        let fetcher = quick(mock.clone(), 5);

        let err = fetcher.fetch(URL, &sample_config(&[URL])).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(mock.call_count(URL), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let fetcher = MockFetcher::new()
            .with_retries(10)
            .with_backoff(Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(fetcher.backoff_for(0), Duration::from_secs(1));
        assert_eq!(fetcher.backoff_for(1), Duration::from_secs(2));
        assert_eq!(fetcher.backoff_for(2), Duration::from_secs(4));
        assert_eq!(fetcher.backoff_for(3), Duration::from_secs(5));
        assert_eq!(fetcher.backoff_for(40), Duration::from_secs(5));
    }
}
