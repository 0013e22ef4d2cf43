//! Fetcher trait: one HTTP GET per seed URL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vacancy_extraction::{Fetcher, HttpFetcher, RunConfig};
//!
//! let config = RunConfig::from_path("data.json")?;
//! let fetcher = HttpFetcher::from_config(&config)?;
//! let page = fetcher.fetch(&config.seed_urls()[0], &config).await?;
//! ```

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::{config::RunConfig, page::RawPage};

/// Retrieves raw markup for a URL under a validated configuration.
///
/// Implementations apply the configured headers, timeout, certificate policy
/// and encoding. They never retry; wrap with `RetryingFetcher` for that.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch and decode one page.
    async fn fetch(&self, url: &str, config: &RunConfig) -> FetchResult<RawPage>;

    /// Check that `config` can be served at all. Runs once before any URL is
    /// fetched; an error here is fatal for the whole run.
    fn prepare(&self, _config: &RunConfig) -> FetchResult<()> {
        Ok(())
    }

    /// Get the fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn fetch(&self, url: &str, config: &RunConfig) -> FetchResult<RawPage> {
        (**self).fetch(url, config).await
    }

    fn prepare(&self, config: &RunConfig) -> FetchResult<()> {
        (**self).prepare(config)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
