//! Source of known city names.

use async_trait::async_trait;

use crate::error::CityResult;

/// Black-box provider of the city reference list.
#[async_trait]
pub trait CityProvider: Send + Sync {
    /// Return every known city name.
    async fn list_cities(&self) -> CityResult<Vec<String>>;

    /// Get the provider name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
