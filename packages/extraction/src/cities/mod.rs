//! City reference providers.
//!
//! # Available Providers
//!
//! - `StaticCityProvider` - a fixed in-process list
//! - `FileCityProvider` - one name per line in a local file
//! - `HtmlTableCityProvider` - one column of an HTML table fetched over HTTP

mod file;
mod table;

use async_trait::async_trait;

use crate::error::CityResult;

pub use file::FileCityProvider;
pub use table::{parse_city_table, HtmlTableCityProvider, DEFAULT_CITIES_URL, DEFAULT_CITY_COLUMN};

// Re-export from traits for convenience
pub use crate::traits::cities::CityProvider;

/// Provider over a list known up front.
#[derive(Debug, Clone, Default)]
pub struct StaticCityProvider {
    names: Vec<String>,
}

impl StaticCityProvider {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CityProvider for StaticCityProvider {
    async fn list_cities(&self) -> CityResult<Vec<String>> {
        Ok(self.names.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
