//! Run configuration and its validator.
//!
//! The raw document is plain JSON. [`RunConfig::validate`] checks each field
//! in a fixed order and reports the first violation, so a `RunConfig` only
//! exists if everything passed. Nothing here touches the network.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};

static SEED_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.*").expect("seed URL pattern is a valid regex"));

/// Maximum accepted request timeout, in seconds.
pub const MAX_TIMEOUT_SECONDS: u64 = 60;

/// Maximum accepted pacing bound, in seconds.
pub const MAX_PACING_SECONDS: u64 = 3600;

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    seed_urls: Vec<String>,
    headers: BTreeMap<String, String>,
    encoding: String,
    timeout_seconds: u64,
    verify_certificate: bool,
    headless_mode: bool,
    pacing: PacingConfig,
    extraction: ExtractionRules,
}

impl RunConfig {
    /// Validate a raw configuration document.
    ///
    /// Check order: seed URLs, headers, encoding, timeout, certificate flag,
    /// headless flag, then the optional `pacing` and `extraction` sections.
    pub fn validate(raw: &Value) -> ConfigResult<Self> {
        let obj = raw.as_object().ok_or(ConfigError::NotAnObject)?;

        let seed_urls = validate_seed_urls(lookup(obj, &["seedUrls", "seed_urls"]))?;
        let headers = validate_headers(lookup(obj, &["headers"]))?;
        let encoding = validate_encoding(lookup(obj, &["encoding"]))?;
        let timeout_seconds =
            validate_timeout(lookup(obj, &["timeout", "timeoutSeconds", "timeout_seconds"]))?;
        let verify_certificate = validate_flag(
            lookup(
                obj,
                &["shouldVerifyCertificate", "should_verify_certificate", "verifyCertificate"],
            ),
            "shouldVerifyCertificate",
        )?;
        let headless_mode =
            validate_flag(lookup(obj, &["headlessMode", "headless_mode"]), "headlessMode")?;

        let pacing = match lookup(obj, &["pacing"]) {
            Some(value) => PacingConfig::from_value(value)?,
            None => PacingConfig::default(),
        };

        let extraction = match lookup(obj, &["extraction"]) {
            Some(value) => ExtractionRules::from_value(value)?,
            None => ExtractionRules::default(),
        };

        Ok(Self {
            seed_urls,
            headers,
            encoding,
            timeout_seconds,
            verify_certificate,
            headless_mode,
            pacing,
            extraction,
        })
    }

    /// Parse and validate a JSON string.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let raw: Value = serde_json::from_str(json)?;
        Self::validate(&raw)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn seed_urls(&self) -> &[String] {
        &self.seed_urls
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Per-request timeout. Zero disables it.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    pub fn verify_certificate(&self) -> bool {
        self.verify_certificate
    }

    /// Recorded for completeness; pages are fetched without a browser.
    pub fn headless_mode(&self) -> bool {
        self.headless_mode
    }

    pub fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }

    pub fn extraction(&self) -> &ExtractionRules {
        &self.extraction
    }

    /// Replace the extraction rules. The caller is responsible for
    /// passing rules that [`ExtractionRules::check`] accepts.
    pub fn with_extraction(mut self, extraction: ExtractionRules) -> Self {
        self.extraction = extraction;
        self
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| obj.get(*key))
}

fn validate_seed_urls(value: Option<&Value>) -> ConfigResult<Vec<String>> {
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| ConfigError::InvalidSeedUrls {
            reason: "seed URLs must be a list".to_string(),
        })?;

    if items.is_empty() {
        return Err(ConfigError::InvalidSeedUrls {
            reason: "seed URL list is empty".to_string(),
        });
    }

    items
        .iter()
        .map(|item| match item.as_str() {
            Some(url) if SEED_URL_PATTERN.is_match(url) => Ok(url.to_string()),
            Some(url) => Err(ConfigError::InvalidSeedUrls {
                reason: format!("`{url}` is not an http(s) URL"),
            }),
            None => Err(ConfigError::InvalidSeedUrls {
                reason: format!("`{item}` is not a string"),
            }),
        })
        .collect()
}

fn validate_headers(value: Option<&Value>) -> ConfigResult<BTreeMap<String, String>> {
    let obj = value
        .and_then(Value::as_object)
        .ok_or_else(|| ConfigError::InvalidHeaders {
            reason: "headers must be an object".to_string(),
        })?;

    obj.iter()
        .map(|(name, value)| match value.as_str() {
            Some(v) => Ok((name.clone(), v.to_string())),
            None => Err(ConfigError::InvalidHeaders {
                reason: format!("value of `{name}` is not a string"),
            }),
        })
        .collect()
}

fn validate_encoding(value: Option<&Value>) -> ConfigResult<String> {
    match value.and_then(Value::as_str) {
        Some(encoding) if !encoding.trim().is_empty() => Ok(encoding.to_string()),
        Some(_) => Err(ConfigError::InvalidEncoding {
            reason: "encoding is empty".to_string(),
        }),
        None => Err(ConfigError::InvalidEncoding {
            reason: "encoding must be a string".to_string(),
        }),
    }
}

fn validate_timeout(value: Option<&Value>) -> ConfigResult<u64> {
    let number = value
        .and_then(Value::as_number)
        .ok_or_else(|| ConfigError::InvalidTimeout {
            reason: "timeout must be an integer".to_string(),
        })?;

    if let Some(seconds) = number.as_u64() {
        if seconds <= MAX_TIMEOUT_SECONDS {
            return Ok(seconds);
        }
    } else if !number.is_i64() {
        return Err(ConfigError::InvalidTimeout {
            reason: format!("{number} is not an integer"),
        });
    }

    Err(ConfigError::InvalidTimeout {
        reason: format!("{number} is outside 0..={MAX_TIMEOUT_SECONDS}"),
    })
}

fn validate_flag(value: Option<&Value>, flag: &'static str) -> ConfigResult<bool> {
    value
        .and_then(Value::as_bool)
        .ok_or(ConfigError::InvalidVerifyFlag { flag })
}

/// Bounds of the random delay applied before each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PacingConfig {
    #[serde(alias = "min_seconds")]
    pub min_seconds: u64,
    #[serde(alias = "max_seconds")]
    pub max_seconds: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_seconds: 1,
            max_seconds: 10,
        }
    }
}

impl PacingConfig {
    fn from_value(value: &Value) -> ConfigResult<Self> {
        let pacing: Self =
            serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidPacing {
                reason: e.to_string(),
            })?;

        if pacing.min_seconds > pacing.max_seconds {
            return Err(ConfigError::InvalidPacing {
                reason: format!(
                    "minSeconds ({}) is greater than maxSeconds ({})",
                    pacing.min_seconds, pacing.max_seconds
                ),
            });
        }
        if pacing.max_seconds > MAX_PACING_SECONDS {
            return Err(ConfigError::InvalidPacing {
                reason: format!(
                    "maxSeconds ({}) is above {MAX_PACING_SECONDS}",
                    pacing.max_seconds
                ),
            });
        }
        Ok(pacing)
    }
}

/// Selectors and separators driving the field heuristics.
///
/// Markup drift on the source site is a config change, not a code change.
/// Defaults target the `vacancy-card` layout the scraper was written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionRules {
    /// Selector for one listing card. `None` extracts document-wide columns.
    pub card: Option<String>,
    pub organization: String,
    pub title: String,
    pub meta: String,
    pub skills: String,
    /// Splits a meta block into city/schedule tokens.
    pub meta_separator: String,
    /// Splits a skills block into the role segment and requirements.
    pub skills_separator: String,
    /// Splits the role segment into general name and experience.
    pub role_separator: String,
    /// Joins tokens back into one label.
    pub joiner: String,
    /// Sentinel for a field with nothing in it.
    pub no_info: String,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            card: Some("div.vacancy-card".to_string()),
            organization: "div.vacancy-card__company-title".to_string(),
            title: "div.vacancy-card__title".to_string(),
            meta: "div.vacancy-card__meta".to_string(),
            skills: "div.vacancy-card__skills".to_string(),
            meta_separator: " • ".to_string(),
            skills_separator: "•".to_string(),
            role_separator: ", ".to_string(),
            joiner: ", ".to_string(),
            no_info: "no info".to_string(),
        }
    }
}

impl ExtractionRules {
    /// Same rules without card scoping.
    pub fn document_wide(mut self) -> Self {
        self.card = None;
        self
    }

    fn from_value(value: &Value) -> ConfigResult<Self> {
        let rules: Self = serde_json::from_value(value.clone()).map_err(|e| {
            ConfigError::InvalidExtractionRules {
                field: "extraction",
                reason: e.to_string(),
            }
        })?;
        rules.check()?;
        Ok(rules)
    }

    /// Reject selectors that do not parse and empty separators.
    pub fn check(&self) -> ConfigResult<()> {
        if let Some(card) = &self.card {
            check_selector("card", card)?;
        }
        check_selector("organization", &self.organization)?;
        check_selector("title", &self.title)?;
        check_selector("meta", &self.meta)?;
        check_selector("skills", &self.skills)?;

        for (field, separator) in [
            ("metaSeparator", &self.meta_separator),
            ("skillsSeparator", &self.skills_separator),
            ("roleSeparator", &self.role_separator),
        ] {
            if separator.is_empty() {
                return Err(ConfigError::InvalidExtractionRules {
                    field,
                    reason: "separator is empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_selector(field: &'static str, selector: &str) -> ConfigResult<()> {
    scraper::Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidExtractionRules {
            field,
            reason: e.to_string(),
        })
}
