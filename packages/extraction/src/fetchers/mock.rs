//! Mock fetcher for testing.
//!
//! Provides a configurable mock implementation of the Fetcher trait.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::Fetcher;
use crate::types::{config::RunConfig, page::RawPage};

/// Mock fetcher for testing.
///
/// Each URL has a steady-state page plus an optional queue of one-shot
/// failures that are served first. Unknown URLs answer with a 404.
///
/// # Example
///
/// ```rust
/// use vacancy_extraction::fetchers::MockFetcher;
/// use vacancy_extraction::FetchError;
///
/// let url = "https://example.com/jobs";
/// let mock = MockFetcher::new()
///     .with_failure(url, FetchError::Timeout { url: url.into() })
///     .with_page(url, "<div class=\"vacancy-card\"></div>");
/// ```
#[derive(Default, Clone)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    failures: Arc<RwLock<HashMap<String, VecDeque<FetchError>>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create a new empty mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page that will be returned for `url`.
    pub fn add_page(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.write().unwrap().insert(url.into(), html.into());
    }

    /// Queue a one-shot failure for `url`.
    pub fn add_failure(&self, url: impl Into<String>, error: FetchError) {
        self.failures
            .write()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(error);
    }

    /// Builder form of [`add_page`](Self::add_page).
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.add_page(url, html);
        self
    }

    /// Builder form of [`add_failure`](Self::add_failure).
    pub fn with_failure(self, url: impl Into<String>, error: FetchError) -> Self {
        self.add_failure(url, error);
        self
    }

    /// Every URL requested, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Number of times `url` was requested.
    pub fn call_count(&self, url: &str) -> usize {
        self.calls.read().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, config: &RunConfig) -> FetchResult<RawPage> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(error) = self
            .failures
            .write()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        match self.pages.read().unwrap().get(url) {
            Some(html) => Ok(RawPage::new(url, html.clone()).with_encoding(config.encoding())),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
