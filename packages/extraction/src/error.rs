//! Typed errors for the vacancy extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Each stage of the pipeline
//! owns one enum so callers can pick a policy per failure kind.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. Always fatal: no run starts with a bad config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config document is not a JSON object
    #[error("configuration must be a JSON object")]
    NotAnObject,

    /// `seedUrls` missing, not a list, empty, or holding a non-HTTP(S) URL
    #[error("invalid seed URLs: {reason}")]
    InvalidSeedUrls { reason: String },

    /// `headers` is not a string-to-string mapping
    #[error("invalid headers: {reason}")]
    InvalidHeaders { reason: String },

    /// `encoding` is not a non-empty string
    #[error("invalid encoding: {reason}")]
    InvalidEncoding { reason: String },

    /// `timeout` is not an integer in [0, 60]
    #[error("invalid timeout: {reason}")]
    InvalidTimeout { reason: String },

    /// A boolean flag has a non-boolean value
    #[error("invalid flag `{flag}`: must be true or false")]
    InvalidVerifyFlag { flag: &'static str },

    /// `pacing` bounds are malformed
    #[error("invalid pacing: {reason}")]
    InvalidPacing { reason: String },

    /// A selector or separator in `extraction` is unusable
    #[error("invalid extraction rule `{field}`: {reason}")]
    InvalidExtractionRules { field: &'static str, reason: String },

    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while fetching one seed URL. The caller decides whether to
/// skip the URL or abort the run; nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Connection could not be established or was dropped
    #[error("connection failed for {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Body could not be read
    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configured encoding label is unknown
    #[error("unsupported encoding: {label}")]
    UnsupportedEncoding { label: String },

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    /// Whether a retry might succeed (timeouts, dropped connections, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Connection { .. } => true,
            FetchError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Lengths of every extracted column for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnLengths {
    pub organizations: usize,
    pub titles: usize,
    pub general_names: usize,
    pub experience_levels: usize,
    pub requirements: usize,
    pub cities: usize,
    pub schedules: usize,
}

impl ColumnLengths {
    pub fn as_array(&self) -> [usize; 7] {
        [
            self.organizations,
            self.titles,
            self.general_names,
            self.experience_levels,
            self.requirements,
            self.cities,
            self.schedules,
        ]
    }

    /// True when every column has the same length.
    pub fn is_aligned(&self) -> bool {
        let lengths = self.as_array();
        lengths.iter().all(|len| *len == lengths[0])
    }
}

impl fmt::Display for ColumnLengths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "organizations={} titles={} general_names={} experience={} requirements={} cities={} schedules={}",
            self.organizations,
            self.titles,
            self.general_names,
            self.experience_levels,
            self.requirements,
            self.cities,
            self.schedules
        )
    }
}

/// Extracted columns for one page disagree in length.
///
/// Position `i` of every column is assumed to describe the same listing
/// card, so a mismatch means records would pair fields from different cards.
#[derive(Debug, Clone, Error)]
#[error("misaligned fields for {url}: {lengths}")]
pub struct AlignmentError {
    pub url: String,
    pub lengths: ColumnLengths,
}

/// Errors surfaced by a vacancy store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record already stored (uniqueness constraint). Usually ignorable.
    #[error("duplicate record: {key}")]
    Duplicate { key: String },

    /// Any other storage failure
    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

/// Errors raised while loading the city reference.
#[derive(Debug, Error)]
pub enum CityError {
    /// Remote city source could not be fetched
    #[error("failed to fetch city list: {0}")]
    Fetch(#[from] FetchError),

    /// Local city list could not be read
    #[error("failed to read city list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No table on the page carries the requested column
    #[error("no table with a `{column}` column")]
    ColumnNotFound { column: String },

    /// Provider returned no names at all
    #[error("city list is empty")]
    Empty,
}

/// Top-level error for a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cities(#[from] CityError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for configuration validation.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for city reference loading.
pub type CityResult<T> = std::result::Result<T, CityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_fetch_errors() {
        assert!(FetchError::Timeout { url: "u".into() }.is_transient());
        assert!(FetchError::Status { url: "u".into(), status: 503 }.is_transient());
        assert!(!FetchError::Status { url: "u".into(), status: 404 }.is_transient());
        assert!(!FetchError::UnsupportedEncoding { label: "x".into() }.is_transient());
    }

    #[test]
    fn test_column_lengths_alignment() {
        let aligned = ColumnLengths {
            organizations: 2,
            titles: 2,
            general_names: 2,
            experience_levels: 2,
            requirements: 2,
            cities: 2,
            schedules: 2,
        };
        assert!(aligned.is_aligned());

        let broken = ColumnLengths { titles: 1, ..aligned };
        assert!(!broken.is_aligned());
        assert!(broken.to_string().contains("titles=1"));
    }

    #[test]
    fn test_duplicate_detection() {
        assert!(StoreError::Duplicate { key: "k".into() }.is_duplicate());
        assert!(!StoreError::Backend("boom".into()).is_duplicate());
    }
}
