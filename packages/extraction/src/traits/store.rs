//! Storage trait for assembled vacancy records.
//!
//! The store is an external collaborator; the pipeline only relies on the
//! write contract below. Implementations must be safe to call concurrently.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::vacancy::VacancyRecord;

/// Write-once sink for vacancy records.
#[async_trait]
pub trait VacancyStore: Send + Sync {
    /// Persist one record.
    ///
    /// Stores that enforce uniqueness return `StoreError::Duplicate` for a
    /// record they already hold, so callers can ignore it.
    async fn write(&self, record: &VacancyRecord) -> StoreResult<()>;

    /// Number of records held.
    async fn count(&self) -> StoreResult<usize>;

    /// Release underlying resources. Called once at the end of a run.
    async fn close(&self) {}
}

#[async_trait]
impl<S: VacancyStore + ?Sized> VacancyStore for std::sync::Arc<S> {
    async fn write(&self, record: &VacancyRecord) -> StoreResult<()> {
        (**self).write(record).await
    }

    async fn count(&self) -> StoreResult<usize> {
        (**self).count().await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
