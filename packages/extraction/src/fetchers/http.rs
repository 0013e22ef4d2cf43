//! HTTP fetcher implementation.
//!
//! One GET per seed URL with the configured headers and timeout, a pacing
//! delay before each request, and the body decoded with the configured
//! encoding regardless of what the response declares.

use async_trait::async_trait;
use encoding_rs::Encoding;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::pacing::PacingDelay;
use crate::traits::fetcher::Fetcher;
use crate::types::{config::RunConfig, page::RawPage};

/// HTTP fetcher backed by `reqwest`.
///
/// The certificate policy is fixed when the client is built; headers,
/// timeout and encoding are read from the config on every call.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_extraction::{Fetcher, HttpFetcher, RunConfig};
///
/// let config = RunConfig::from_path("data.json")?;
/// let fetcher = HttpFetcher::from_config(&config)?;
/// let page = fetcher.fetch("https://career.habr.com/vacancies", &config).await?;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
    pacing: PacingDelay,
}

impl HttpFetcher {
    /// Create a fetcher with the default pacing range.
    pub fn new(verify_certificate: bool) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_certificate)
            .build()
            .map_err(|e| FetchError::Client(Box::new(e)))?;

        Ok(Self {
            client,
            pacing: PacingDelay::default(),
        })
    }

    /// Create a fetcher honoring the config's certificate policy and pacing.
    ///
    /// Fails if the encoding label or a header cannot be used.
    pub fn from_config(config: &RunConfig) -> FetchResult<Self> {
        let fetcher = Self::new(config.verify_certificate())?
            .with_pacing(PacingDelay::from_config(config.pacing()));
        fetcher.prepare(config)?;
        Ok(fetcher)
    }

    /// Set the pacing delay.
    pub fn with_pacing(mut self, pacing: PacingDelay) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, config: &RunConfig) -> FetchResult<RawPage> {
        let encoding = resolve_encoding(config.encoding())?;
        let headers = header_map(config.headers())?;

        self.pacing.wait().await;

        debug!(url = %url, "HTTP fetch starting");
        let mut request = self.client.get(url).headers(headers);
        if let Some(timeout) = config.timeout() {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            request_error(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: Box::new(e),
                }
            }
        })?;

        let html = decode_body(&body, encoding);
        debug!(
            url = %url,
            bytes = body.len(),
            encoding = encoding.name(),
            "Page fetched successfully"
        );

        let mut page = RawPage::new(url, html)
            .with_encoding(config.encoding())
            .with_status(status.as_u16())
            .with_metadata("final_url", final_url);
        if let Some(ct) = content_type {
            page = page.with_metadata("http_content-type", ct);
        }
        Ok(page)
    }

    fn prepare(&self, config: &RunConfig) -> FetchResult<()> {
        resolve_encoding(config.encoding())?;
        header_map(config.headers())?;
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Look up an encoding by its WHATWG label (`utf-8`, `windows-1251`, `cp1251`...).
pub fn resolve_encoding(label: &str) -> FetchResult<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| FetchError::UnsupportedEncoding {
        label: label.to_string(),
    })
}

/// Decode a body with the given encoding, ignoring any declared charset.
///
/// A matching BOM is stripped; malformed sequences become U+FFFD.
pub fn decode_body(body: &[u8], encoding: &'static Encoding) -> String {
    let (text, had_errors) = encoding.decode_with_bom_removal(body);
    if had_errors {
        debug!(encoding = encoding.name(), "Body contained malformed sequences");
    }
    text.into_owned()
}

fn header_map(headers: &BTreeMap<String, String>) -> FetchResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::Client(Box::new(e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| FetchError::Client(Box::new(e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn request_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            source: Box::new(error),
        }
    }
}
