//! Run orchestration: fetch → extract → assemble → store, per seed URL.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ConfigResult, PipelineError, Result};
use crate::pipeline::{assemble::assemble, extract::FieldExtractor};
use crate::traits::{fetcher::Fetcher, store::VacancyStore};
use crate::types::{cities::CityReference, config::RunConfig};

/// What to do when a page-level failure happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure in the report and continue with the next URL
    #[default]
    Skip,
    /// Stop the run and return the error
    Abort,
}

/// Failure handling and parallelism for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    /// Policy for fetch failures
    pub on_fetch_error: FailurePolicy,

    /// Policy for pages whose field columns do not line up
    pub on_alignment_error: FailurePolicy,

    /// Number of seed URLs processed at once
    pub concurrency: usize,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            on_fetch_error: FailurePolicy::Skip,
            on_alignment_error: FailurePolicy::Skip,
            concurrency: 1,
        }
    }
}

impl RunPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort on the first fetch or alignment failure.
    pub fn fail_fast() -> Self {
        Self {
            on_fetch_error: FailurePolicy::Abort,
            on_alignment_error: FailurePolicy::Abort,
            ..Self::default()
        }
    }

    /// Set concurrency (clamped to at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Number of seed URLs fetched successfully
    pub pages_fetched: usize,

    /// Seed URLs whose fetch failed and were skipped
    pub failed_urls: Vec<String>,

    /// Seed URLs whose records were discarded for misalignment
    pub misaligned_urls: Vec<String>,

    /// Listing cards dropped for a missing sub-block
    pub cards_skipped: usize,

    /// Records accepted by the store
    pub records_written: usize,

    /// Records the store already held
    pub duplicates_ignored: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if every seed URL was fetched and assembled.
    pub fn is_success(&self) -> bool {
        self.failed_urls.is_empty() && self.misaligned_urls.is_empty()
    }

    fn absorb(&mut self, page: PageReport) {
        match page.outcome {
            PageOutcome::Stored => self.pages_fetched += 1,
            PageOutcome::FetchFailed => self.failed_urls.push(page.url),
            PageOutcome::Misaligned => {
                self.pages_fetched += 1;
                self.misaligned_urls.push(page.url);
            }
        }
        self.cards_skipped += page.cards_skipped;
        self.records_written += page.records_written;
        self.duplicates_ignored += page.duplicates_ignored;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Stored,
    FetchFailed,
    Misaligned,
}

#[derive(Debug)]
struct PageReport {
    url: String,
    outcome: PageOutcome,
    cards_skipped: usize,
    records_written: usize,
    duplicates_ignored: usize,
}

impl PageReport {
    fn new(url: &str, outcome: PageOutcome) -> Self {
        Self {
            url: url.to_string(),
            outcome,
            cards_skipped: 0,
            records_written: 0,
            duplicates_ignored: 0,
        }
    }
}

/// One scraping run over every seed URL in a [`RunConfig`].
///
/// Config and city reference are shared read-only; the fetcher and store
/// are owned for the run. Each seed URL is an independent
/// fetch/extract/assemble/write sequence.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_extraction::{CityReference, HttpFetcher, MemoryStore, Pipeline, RunConfig};
///
/// let config = RunConfig::from_path("data.json")?;
/// let fetcher = HttpFetcher::from_config(&config)?;
/// let cities = CityReference::new(["Moscow", "Kazan"]);
/// let pipeline = Pipeline::new(config, cities, fetcher, MemoryStore::new())?;
/// let report = pipeline.run_and_close().await?;
/// ```
pub struct Pipeline<F, S> {
    config: Arc<RunConfig>,
    cities: Arc<CityReference>,
    extractor: FieldExtractor,
    fetcher: F,
    store: S,
    policy: RunPolicy,
}

impl<F: Fetcher, S: VacancyStore> Pipeline<F, S> {
    /// Build a pipeline; compiles the config's extraction rules.
    pub fn new(
        config: RunConfig,
        cities: CityReference,
        fetcher: F,
        store: S,
    ) -> ConfigResult<Self> {
        let extractor = FieldExtractor::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            cities: Arc::new(cities),
            extractor,
            fetcher,
            store,
            policy: RunPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn policy(&self) -> &RunPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process every seed URL. The store is left open.
    ///
    /// A config the fetcher cannot serve fails the run before any URL is
    /// fetched, whatever the policy.
    pub async fn run(&self) -> Result<RunReport> {
        self.fetcher.prepare(&self.config)?;

        let seed_urls = self.config.seed_urls();
        info!(
            seed_urls = seed_urls.len(),
            fetcher = self.fetcher.name(),
            concurrency = self.policy.concurrency,
            "Starting scrape run"
        );

        let report = stream::iter(seed_urls)
            .map(|url| self.process_url(url))
            .buffered(self.policy.concurrency.max(1))
            .try_fold(RunReport::new(), |mut report, page| async move {
                report.absorb(page);
                Ok::<_, PipelineError>(report)
            })
            .await?;

        info!(
            pages_fetched = report.pages_fetched,
            failed = report.failed_urls.len(),
            misaligned = report.misaligned_urls.len(),
            cards_skipped = report.cards_skipped,
            records_written = report.records_written,
            duplicates_ignored = report.duplicates_ignored,
            "Scrape run complete"
        );
        Ok(report)
    }

    /// Run, then close the store whether or not the run succeeded.
    pub async fn run_and_close(self) -> Result<RunReport> {
        let result = self.run().await;
        self.store.close().await;
        result
    }

    async fn process_url(&self, url: &str) -> Result<PageReport> {
        let page = match self.fetcher.fetch(url, &self.config).await {
            Ok(page) => page,
            Err(e) => match self.policy.on_fetch_error {
                FailurePolicy::Skip => {
                    warn!(url = %url, error = %e, "Fetch failed, skipping seed URL");
                    return Ok(PageReport::new(url, PageOutcome::FetchFailed));
                }
                FailurePolicy::Abort => return Err(e.into()),
            },
        };

        let fields = self.extractor.extract(&page, &self.cities);
        let cards_skipped = fields.skipped_cards;

        let records = match assemble(fields) {
            Ok(records) => records,
            Err(e) => match self.policy.on_alignment_error {
                FailurePolicy::Skip => {
                    warn!(url = %url, lengths = %e.lengths, "Discarding misaligned page");
                    let mut report = PageReport::new(url, PageOutcome::Misaligned);
                    report.cards_skipped = cards_skipped;
                    return Ok(report);
                }
                FailurePolicy::Abort => return Err(e.into()),
            },
        };

        let mut report = PageReport::new(url, PageOutcome::Stored);
        report.cards_skipped = cards_skipped;

        for record in &records {
            match self.store.write(record).await {
                Ok(()) => report.records_written += 1,
                Err(e) if e.is_duplicate() => {
                    debug!(url = %url, error = %e, "Duplicate vacancy ignored");
                    report.duplicates_ignored += 1;
                }
                Err(e) => return Err(PipelineError::Store(e)),
            }
        }

        info!(
            url = %url,
            records = records.len(),
            written = report.records_written,
            duplicates = report.duplicates_ignored,
            "Page processed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, StoreError};
    use crate::fetchers::HttpFetcher;
    use crate::pacing::PacingDelay;
    use crate::stores::MemoryStore;
    use crate::testing::{
        listing_card, listing_page, sample_config, FailingStore, ListingCard, MockFetcher,
    };
    use crate::types::config::ExtractionRules;

    const A: &str = "https://example.com/a";
    const B: &str = "https://example.com/b";

    fn cities() -> CityReference {
        CityReference::new(["Moscow", "Kazan"])
    }

    fn page_a() -> String {
        listing_page(&[
            listing_card("Acme", "Rust Engineer", "Moscow • Remote", "Backend, Senior • Rust"),
            listing_card("Globex", "QA Lead", "Kazan", "QA"),
        ])
    }

    fn page_b() -> String {
        listing_page(&[listing_card("Initech", "Analyst", "Office", "Data, Junior • SQL")])
    }

    #[tokio::test]
    async fn test_run_writes_every_page_in_order() {
        let fetcher = MockFetcher::new().with_page(A, page_a()).with_page(B, page_b());
        let pipeline =
            Pipeline::new(sample_config(&[A, B]), cities(), fetcher, MemoryStore::new()).unwrap();

        let report = pipeline.run().await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.records_written, 3);

        let titles: Vec<_> = pipeline
            .store()
            .records()
            .into_iter()
            .map(|r| r.vacancy_title)
            .collect();
        assert_eq!(titles, vec!["Rust Engineer", "QA Lead", "Analyst"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_skipped_by_default() {
        let fetcher = MockFetcher::new()
            .with_failure(A, FetchError::Timeout { url: A.into() })
            .with_page(B, page_b());
        let pipeline =
            Pipeline::new(sample_config(&[A, B]), cities(), fetcher, MemoryStore::new()).unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.failed_urls, vec![A.to_string()]);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.records_written, 1);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_when_fail_fast() {
        let fetcher = MockFetcher::new()
            .with_failure(A, FetchError::Status { url: A.into(), status: 500 })
            .with_page(B, page_b());
        let pipeline =
            Pipeline::new(sample_config(&[A, B]), cities(), fetcher.clone(), MemoryStore::new())
                .unwrap()
                .with_policy(RunPolicy::fail_fast());

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Fetch(FetchError::Status { status: 500, .. })));
        assert_eq!(fetcher.call_count(B), 0);
        assert_eq!(pipeline.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_misaligned_page_discarded_and_reported() {
        let config = sample_config(&[A, B])
            .with_extraction(ExtractionRules::default().document_wide());
        let broken = listing_page(&[
            listing_card("Acme", "Rust Engineer", "Moscow", "Backend"),
            ListingCard::new("Globex", "QA Lead").with_meta("Kazan").render(),
        ]);
        let fetcher = MockFetcher::new().with_page(A, broken).with_page(B, page_b());
        let pipeline = Pipeline::new(config, cities(), fetcher, MemoryStore::new()).unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.misaligned_urls, vec![A.to_string()]);
        assert_eq!(report.records_written, 1);
        assert_eq!(pipeline.store().records()[0].organization, "Initech");
    }

    #[tokio::test]
    async fn test_misaligned_page_aborts_when_fail_fast() {
        let config = sample_config(&[A])
            .with_extraction(ExtractionRules::default().document_wide());
        let broken =
            listing_page(&[ListingCard::new("Globex", "QA Lead").with_meta("Kazan").render()]);
        let fetcher = MockFetcher::new().with_page(A, broken);
        let pipeline = Pipeline::new(config, cities(), fetcher, MemoryStore::new())
            .unwrap()
            .with_policy(RunPolicy::fail_fast());

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Alignment(_)));
    }

    #[tokio::test]
    async fn test_incomplete_cards_counted() {
        let page = listing_page(&[
            listing_card("Acme", "Rust Engineer", "Moscow", "Backend"),
            ListingCard::new("Globex", "QA Lead").render(),
        ]);
        let fetcher = MockFetcher::new().with_page(A, page);
        let pipeline =
            Pipeline::new(sample_config(&[A]), cities(), fetcher, MemoryStore::new()).unwrap();

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.cards_skipped, 1);
        assert_eq!(report.records_written, 1);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_duplicates_ignored() {
        let fetcher = MockFetcher::new().with_page(A, page_a());
        let pipeline =
            Pipeline::new(sample_config(&[A, A]), cities(), fetcher, MemoryStore::unique())
                .unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.records_written, 2);
        assert_eq!(report.duplicates_ignored, 2);
        assert_eq!(pipeline.store().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_and_closes() {
        let fetcher = MockFetcher::new().with_page(A, page_a());
        let store = Arc::new(FailingStore::new());
        let pipeline =
            Pipeline::new(sample_config(&[A]), cities(), fetcher, store.clone()).unwrap();

        let err = pipeline.run_and_close().await.unwrap_err();

        assert!(matches!(err, PipelineError::Store(StoreError::Backend(_))));
        assert_eq!(store.attempts(), 1);
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_seed_order_in_report() {
        let fetcher = MockFetcher::new()
            .with_failure(A, FetchError::Timeout { url: A.into() })
            .with_failure(B, FetchError::Timeout { url: B.into() });
        let pipeline =
            Pipeline::new(sample_config(&[A, B]), cities(), fetcher, MemoryStore::new())
                .unwrap()
                .with_policy(RunPolicy::new().with_concurrency(4));

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.failed_urls, vec![A.to_string(), B.to_string()]);
    }

    #[tokio::test]
    async fn test_run_and_close_closes_store_on_success() {
        let fetcher = MockFetcher::new().with_page(A, page_b());
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            Pipeline::new(sample_config(&[A]), cities(), fetcher, store.clone()).unwrap();

        let report = pipeline.run_and_close().await.unwrap();

        assert_eq!(report.records_written, 1);
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_unusable_encoding_fails_before_any_fetch() {
        let config = RunConfig::validate(&serde_json::json!({
            "seedUrls": ["http://127.0.0.1:9/a", "http://127.0.0.1:9/b"],
            "headers": {},
            "encoding": "klingon",
            "timeout": 1,
            "shouldVerifyCertificate": true,
            "headlessMode": false
        }))
        .unwrap();
        let fetcher = HttpFetcher::new(true).unwrap().with_pacing(PacingDelay::none());
        let store = Arc::new(MemoryStore::new());
        let pipeline = Pipeline::new(config, cities(), fetcher, store.clone()).unwrap();

        let err = pipeline.run_and_close().await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Fetch(FetchError::UnsupportedEncoding { .. })
        ));
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.is_closed());
    }

    #[test]
    fn test_concurrency_clamped() {
        assert_eq!(RunPolicy::new().with_concurrency(0).concurrency, 1);
    }
}
