//! Fetcher implementations.
//!
//! # Available Fetchers
//!
//! - `HttpFetcher` - reqwest GET with pacing and forced decoding
//! - `RetryingFetcher` - caller-level retry wrapper for any fetcher
//! - `MockFetcher` - For testing
//!
//! # Example
//!
//! ```rust,ignore
//! use vacancy_extraction::fetchers::{FetcherExt, HttpFetcher};
//!
//! let fetcher = HttpFetcher::from_config(&config)?.with_retries(2);
//! let page = fetcher.fetch(url, &config).await?;
//! ```

mod http;
mod mock;
mod retry;

pub use http::{decode_body, resolve_encoding, HttpFetcher};
pub use mock::MockFetcher;
pub use retry::{FetcherExt, RetryingFetcher};

// Re-export from traits for convenience
pub use crate::traits::fetcher::Fetcher;
