//! City list scraped from one column of an HTML table.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{CityError, CityResult, FetchError};
use crate::fetchers::{decode_body, resolve_encoding};
use crate::traits::cities::CityProvider;

/// Wikipedia's list of Russian cities.
pub const DEFAULT_CITIES_URL: &str =
    "https://ru.wikipedia.org/wiki/%D0%A1%D0%BF%D0%B8%D1%81%D0%BE%D0%BA_%D0%B3%D0%BE%D1%80%D0%BE%D0%B4%D0%BE%D0%B2_%D0%A0%D0%BE%D1%81%D1%81%D0%B8%D0%B8";

/// Header of the city-name column on [`DEFAULT_CITIES_URL`].
pub const DEFAULT_CITY_COLUMN: &str = "Город";

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Fetches a page and reads the named column of its first matching table.
pub struct HtmlTableCityProvider {
    url: String,
    column: String,
    encoding: String,
    client: reqwest::Client,
}

impl HtmlTableCityProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            column: DEFAULT_CITY_COLUMN.to_string(),
            encoding: "utf-8".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Read the column with this header instead of [`DEFAULT_CITY_COLUMN`].
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn fetch_html(&self) -> CityResult<String> {
        let encoding = resolve_encoding(&self.encoding)?;
        let url = self.url.as_str();

        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::USER_AGENT,
                concat!("vacancy-extraction/", env!("CARGO_PKG_VERSION")),
            )
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout { url: url.to_string() }
                } else {
                    FetchError::Connection {
                        url: url.to_string(),
                        source: Box::new(e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        debug!(url = %url, bytes = body.len(), "City source fetched");

        Ok(decode_body(&body, encoding))
    }
}

#[async_trait]
impl CityProvider for HtmlTableCityProvider {
    async fn list_cities(&self) -> CityResult<Vec<String>> {
        let html = self.fetch_html().await?;
        let cities = parse_city_table(&html, &self.column)?;
        info!(url = %self.url, column = %self.column, cities = cities.len(), "City table parsed");
        Ok(cities)
    }

    fn name(&self) -> &str {
        "html-table"
    }
}

/// Read `column` from the first table whose header row has it.
///
/// Header and cell text are compared with footnote markers (`Город[1]`)
/// stripped. Rows without a cell at the column's position are skipped.
pub fn parse_city_table(html: &str, column: &str) -> CityResult<Vec<String>> {
    let document = Html::parse_document(html);

    for table in document.select(&TABLE) {
        let mut rows = table.select(&ROW);
        let Some(index) = rows.by_ref().find_map(|row| {
            let headers = cells(row, Some("th"));
            (!headers.is_empty())
                .then(|| headers.iter().position(|header| header == column))
                .flatten()
        }) else {
            continue;
        };

        let names = rows
            .filter(|row| row.select(&CELL_TD).next().is_some())
            .filter_map(|row| cells(row, None).into_iter().nth(index))
            .filter(|name| !name.is_empty())
            .collect();
        return Ok(names);
    }

    Err(CityError::ColumnNotFound {
        column: column.to_string(),
    })
}

/// Direct cell children of a row, as clean text. `only` restricts the tag.
fn cells(row: ElementRef<'_>, only: Option<&str>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| {
            let name = cell.value().name();
            (name == "td" || name == "th") && only.map_or(true, |tag| name == tag)
        })
        .map(cell_text)
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let text = cell.text().collect::<String>();
    let text = text.split('[').next().unwrap_or_default();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
