//! Raw page type handed from the fetcher to the field extractor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fetched and decoded markup for one seed URL.
///
/// Lives only between fetch and extraction; it is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    /// Seed URL the page was requested from
    pub url: String,

    /// Decoded markup
    pub html: String,

    /// Encoding label used to decode the body (from the run config)
    pub encoding: String,

    /// HTTP status of the response
    pub status: u16,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,

    /// Response details (e.g. `http_content-type`, `final_url`)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RawPage {
    /// Create a page with a 200 status and UTF-8 encoding.
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            encoding: "utf-8".to_string(),
            status: 200,
            fetched_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Set the encoding label.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Set the HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_page_builder() {
        let page = RawPage::new("https://example.com/jobs", "<div>jobs</div>")
            .with_encoding("windows-1251")
            .with_status(203)
            .with_metadata("final_url", "https://example.com/jobs?page=1");

        assert_eq!(page.url, "https://example.com/jobs");
        assert_eq!(page.encoding, "windows-1251");
        assert_eq!(page.status, 203);
        assert_eq!(
            page.metadata.get("final_url"),
            Some(&"https://example.com/jobs?page=1".to_string())
        );
    }
}
