//! SQLite storage implementation.
//!
//! One `vacancies` table with a column per record field. Requirements are
//! stored as a JSON array, keeping tokens that contain commas intact. A
//! fingerprint primary key makes re-running the same seed list idempotent.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::VacancyStore;
use crate::types::vacancy::VacancyRecord;

/// SQLite-backed vacancy store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `database_url`.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://vacancies.db` - File-based database
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(backend)?
            .create_if_missing(true);

        // Every connection to `:memory:` is a separate database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(backend)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> StoreResult<Self> {
        Self::new("sqlite::memory:").await
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vacancies (
                record_key TEXT PRIMARY KEY,
                organization TEXT NOT NULL,
                vacancy_name TEXT NOT NULL,
                general_name TEXT NOT NULL,
                experience TEXT NOT NULL,
                requirements TEXT NOT NULL,
                city TEXT NOT NULL,
                work_schedule TEXT NOT NULL,
                scraped_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_vacancies_organization ON vacancies(organization);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every stored record, oldest first.
    pub async fn records(&self) -> StoreResult<Vec<VacancyRecord>> {
        let rows: Vec<VacancyRow> = sqlx::query_as(
            r#"
            SELECT organization, vacancy_name, general_name, experience,
                   requirements, city, work_schedule
            FROM vacancies
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(VacancyRow::into_record).collect()
    }
}

#[derive(Debug, FromRow)]
struct VacancyRow {
    organization: String,
    vacancy_name: String,
    general_name: String,
    experience: String,
    requirements: String,
    city: String,
    work_schedule: String,
}

impl VacancyRow {
    fn into_record(self) -> StoreResult<VacancyRecord> {
        let requirements: Vec<String> = serde_json::from_str(&self.requirements)
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        Ok(VacancyRecord {
            organization: self.organization,
            vacancy_title: self.vacancy_name,
            general_name: self.general_name,
            experience_level: self.experience,
            requirements,
            city: self.city,
            work_schedule: self.work_schedule,
        })
    }
}

#[async_trait]
impl VacancyStore for SqliteStore {
    async fn write(&self, record: &VacancyRecord) -> StoreResult<()> {
        let key = record.fingerprint();
        let requirements = serde_json::to_string(&record.requirements)
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO vacancies
                (record_key, organization, vacancy_name, general_name, experience,
                 requirements, city, work_schedule, scraped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&key)
        .bind(&record.organization)
        .bind(&record.vacancy_title)
        .bind(&record.general_name)
        .bind(&record.experience_level)
        .bind(&requirements)
        .bind(&record.city)
        .bind(&record.work_schedule)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(key = %key, organization = %record.organization, "Vacancy stored");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate { key })
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn count(&self) -> StoreResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vacancies")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(count as usize)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    fn record(title: &str, requirements: &[&str]) -> VacancyRecord {
        VacancyRecord {
            organization: "Acme".into(),
            vacancy_title: title.into(),
            general_name: "Backend".into(),
            experience_level: "3 years".into(),
            requirements: requirements.iter().map(|s| s.to_string()).collect(),
            city: "Moscow".into(),
            work_schedule: "Remote, Full-time".into(),
        }
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let store = test_store().await;
        let first = record("Rust Engineer", &["Rust", "Tokio"]);
        let second = record("Go Engineer", &[]);

        store.write(&first).await.unwrap();
        store.write(&second).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.records().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_requirements_persisted_as_json_array() {
        let store = test_store().await;
        store
            .write(&record("Backend Developer", &["Python", "SQL"]))
            .await
            .unwrap();

        let (requirements,): (String,) = sqlx::query_as("SELECT requirements FROM vacancies")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(requirements, r#"["Python","SQL"]"#);
    }

    #[tokio::test]
    async fn test_comma_bearing_requirement_round_trips() {
        let store = test_store().await;
        let combined = record("Backend Developer", &["Python, Django", "SQL"]);
        let split = record("Backend Developer", &["Python", "Django", "SQL"]);

        store.write(&combined).await.unwrap();
        store.write(&split).await.unwrap();

        assert_eq!(store.records().await.unwrap(), vec![combined, split]);
    }

    #[tokio::test]
    async fn test_duplicate_write_reported() {
        let store = test_store().await;
        let vacancy = record("Rust Engineer", &["Rust"]);

        store.write(&vacancy).await.unwrap();
        let err = store.write(&vacancy).await.unwrap_err();

        assert!(err.is_duplicate());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_write_after_close_is_backend_error() {
        let store = test_store().await;
        store.close().await;

        let err = store.write(&record("Late", &[])).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
