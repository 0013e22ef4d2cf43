//! Job-Vacancy Scraping Library
//!
//! Fetches job-listing pages, pulls structured fields out of loosely
//! structured markup, zips them into vacancy records and hands the records
//! to a store.
//!
//! # Design
//!
//! - Configuration is validated once, up front; a run never starts with a
//!   bad config
//! - Extraction is heuristic: fields are located by position and split by
//!   separators, all of which live in [`ExtractionRules`]
//! - Alignment is checked, never assumed: misaligned columns are rejected,
//!   not truncated
//! - Failure policy is explicit: fetch and alignment failures are skipped
//!   or abort the run per [`RunPolicy`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use vacancy_extraction::{
//!     CityReference, HttpFetcher, MemoryStore, Pipeline, RunConfig, StaticCityProvider,
//! };
//!
//! let config = RunConfig::from_path("data.json")?;
//! let cities = CityReference::load(&StaticCityProvider::new(["Москва", "Казань"])).await?;
//! let fetcher = HttpFetcher::from_config(&config)?;
//!
//! let report = Pipeline::new(config, cities, fetcher, MemoryStore::new())?
//!     .run_and_close()
//!     .await?;
//! println!("{} vacancies written", report.records_written);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Fetcher, VacancyStore, CityProvider)
//! - [`types`] - Config, page, field and record types
//! - [`pipeline`] - Extraction, assembly and run orchestration
//! - [`fetchers`] - Fetcher implementations (HttpFetcher, RetryingFetcher)
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore)
//! - [`cities`] - City reference providers
//! - [`testing`] - Mock implementations and fixtures for testing

pub mod cities;
pub mod error;
pub mod fetchers;
pub mod pacing;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    AlignmentError, CityError, ColumnLengths, ConfigError, FetchError, PipelineError, Result,
    StoreError,
};
pub use traits::{cities::CityProvider, fetcher::Fetcher, store::VacancyStore};
pub use types::{
    cities::CityReference,
    config::{ExtractionRules, PacingConfig, RunConfig},
    page::RawPage,
    vacancy::{AlignedFields, FieldArrays, VacancyRecord},
};

// Re-export pipeline components
pub use pipeline::{
    assemble, FailurePolicy, FieldExtractor, MetaFields, Pipeline, RunPolicy, RunReport,
    SkillsFields,
};

// Re-export fetchers
pub use fetchers::{FetcherExt, HttpFetcher, RetryingFetcher};
pub use pacing::PacingDelay;

// Re-export city providers
pub use cities::{FileCityProvider, HtmlTableCityProvider, StaticCityProvider};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

// Re-export testing utilities
pub use testing::{FailingStore, MockFetcher};
