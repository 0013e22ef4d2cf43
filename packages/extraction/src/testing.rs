//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without making network calls or touching a database.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{StoreError, StoreResult};
use crate::traits::store::VacancyStore;
use crate::types::{config::RunConfig, vacancy::VacancyRecord};

pub use crate::fetchers::MockFetcher;

/// A valid config for `seed_urls` with pacing disabled.
///
/// Panics if a URL is not http(s); intended for tests only.
pub fn sample_config(seed_urls: &[&str]) -> RunConfig {
    RunConfig::validate(&json!({
        "seedUrls": seed_urls,
        "headers": {"User-Agent": "vacancy-extraction-tests"},
        "encoding": "utf-8",
        "timeout": 10,
        "shouldVerifyCertificate": true,
        "headlessMode": false,
        "pacing": {"minSeconds": 0, "maxSeconds": 0}
    }))
    .expect("sample config must be valid")
}

/// Builder for one listing card in the default `vacancy-card` markup.
///
/// Meta and skills blocks are only rendered when set, so incomplete cards
/// are easy to produce.
#[derive(Debug, Clone, Default)]
pub struct ListingCard {
    organization: String,
    title: String,
    meta: Option<String>,
    skills: Option<String>,
}

impl ListingCard {
    pub fn new(organization: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    pub fn with_skills(mut self, skills: impl Into<String>) -> Self {
        self.skills = Some(skills.into());
        self
    }

    pub fn render(&self) -> String {
        let mut html = String::from("<div class=\"vacancy-card\">");
        html.push_str(&format!(
            "<div class=\"vacancy-card__company-title\"><a href=\"/companies/x\">{}</a></div>",
            escape(&self.organization)
        ));
        html.push_str(&format!(
            "<div class=\"vacancy-card__title\"><a href=\"/vacancies/1\">{}</a></div>",
            escape(&self.title)
        ));
        if let Some(meta) = &self.meta {
            html.push_str(&format!("<div class=\"vacancy-card__meta\">{}</div>", escape(meta)));
        }
        if let Some(skills) = &self.skills {
            html.push_str(&format!(
                "<div class=\"vacancy-card__skills\">{}</div>",
                escape(skills)
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// Render a complete card.
pub fn listing_card(organization: &str, title: &str, meta: &str, skills: &str) -> String {
    ListingCard::new(organization, title)
        .with_meta(meta)
        .with_skills(skills)
        .render()
}

/// Wrap rendered cards in a listing page.
pub fn listing_page(cards: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Vacancies</title></head>\
         <body><div class=\"section-group\">{}</div></body></html>",
        cards.concat()
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A store whose writes always fail with a backend error.
#[derive(Debug, Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
    closed: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VacancyStore for FailingStore {
    async fn write(&self, _record: &VacancyRecord) -> StoreResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("disk full".into()))
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(0)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
