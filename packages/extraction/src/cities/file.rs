//! City list read from a local text file.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{CityError, CityResult};
use crate::traits::cities::CityProvider;

/// Reads one city name per line. Blank lines and `#` comments are skipped.
#[derive(Debug, Clone)]
pub struct FileCityProvider {
    path: PathBuf,
}

impl FileCityProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl CityProvider for FileCityProvider {
    async fn list_cities(&self) -> CityResult<Vec<String>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CityError::Io {
                path: self.path.clone(),
                source,
            })?;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &str {
        "file"
    }
}
