//! Read-only set of known city names.

use std::collections::HashSet;

use crate::error::{CityError, CityResult};
use crate::traits::cities::CityProvider;

/// City names used to tell city tokens apart from schedule tokens.
///
/// Loaded once per run and shared read-only across pages. Matching is exact,
/// so "Moscow" and "moscow" are different names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityReference {
    names: HashSet<String>,
}

impl CityReference {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .map(|name: String| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Load the reference from a provider. An empty list is an error.
    pub async fn load<P: CityProvider + ?Sized>(provider: &P) -> CityResult<Self> {
        let reference = Self::new(provider.list_cities().await?);
        if reference.is_empty() {
            return Err(CityError::Empty);
        }
        tracing::info!(
            provider = provider.name(),
            cities = reference.len(),
            "City reference loaded"
        );
        Ok(reference)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.names.contains(token)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
