//! Scrape job listings for every seed URL in a config file.
//!
//! Exits non-zero when the config is invalid, the city reference cannot be
//! loaded, or the run is aborted under `--fail-fast`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vacancy_extraction::{
    CityProvider, CityReference, FetcherExt, FileCityProvider, HtmlTableCityProvider,
    MemoryStore, Pipeline, RunConfig, RunPolicy, VacancyStore,
};

#[derive(Parser)]
#[command(name = "scrape_vacancies")]
#[command(about = "Scrape job listings into a vacancy store")]
struct Cli {
    /// Path to the JSON run configuration
    #[arg(long)]
    config: PathBuf,

    /// SQLite database URL (falls back to VACANCY_DATABASE_URL, then sqlite://vacancies.db)
    #[arg(long)]
    database: Option<String>,

    /// Keep records in memory only; nothing is persisted
    #[arg(long, conflicts_with = "database")]
    dry_run: bool,

    /// Local city list, one name per line
    #[arg(long, conflicts_with = "cities_url")]
    cities_file: Option<PathBuf>,

    /// Page with a table of city names
    #[arg(long, value_parser = url::Url::parse)]
    cities_url: Option<url::Url>,

    /// Header of the city column in the `--cities-url` table
    #[arg(long, default_value = vacancy_extraction::cities::DEFAULT_CITY_COLUMN)]
    cities_column: String,

    /// Abort on the first fetch failure or misaligned page
    #[arg(long)]
    fail_fast: bool,

    /// Seed URLs processed at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Retries for transient fetch failures
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vacancy_extraction=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = RunConfig::from_path(&cli.config)
        .with_context(|| format!("Invalid configuration in {}", cli.config.display()))?;
    tracing::info!(
        seed_urls = config.seed_urls().len(),
        encoding = config.encoding(),
        timeout_seconds = config.timeout_seconds(),
        "Configuration loaded"
    );
    if config.headless_mode() {
        tracing::warn!("headlessMode is set but pages are fetched without a browser");
    }

    let provider: Box<dyn CityProvider> = match (&cli.cities_file, &cli.cities_url) {
        (Some(path), _) => Box::new(FileCityProvider::new(path)),
        (None, Some(url)) => {
            Box::new(HtmlTableCityProvider::new(url.as_str()).with_column(&cli.cities_column))
        }
        (None, None) => Box::new(
            HtmlTableCityProvider::new(vacancy_extraction::cities::DEFAULT_CITIES_URL)
                .with_column(&cli.cities_column),
        ),
    };
    let cities = CityReference::load(provider.as_ref())
        .await
        .context("Failed to load city reference")?;

    let fetcher = vacancy_extraction::HttpFetcher::from_config(&config)
        .context("Failed to build HTTP client")?
        .with_retries(cli.retries);

    let store = open_store(&cli).await?;

    let policy = if cli.fail_fast {
        RunPolicy::fail_fast()
    } else {
        RunPolicy::new()
    }
    .with_concurrency(cli.concurrency);

    let pipeline = match Pipeline::new(config, cities, fetcher, store.clone()) {
        Ok(pipeline) => pipeline.with_policy(policy),
        Err(e) => {
            store.close().await;
            return Err(e).context("Invalid extraction rules");
        }
    };

    let report = pipeline.run_and_close().await.context("Scrape run aborted")?;

    tracing::info!(
        pages_fetched = report.pages_fetched,
        records_written = report.records_written,
        duplicates_ignored = report.duplicates_ignored,
        cards_skipped = report.cards_skipped,
        "Done"
    );
    for url in &report.failed_urls {
        tracing::warn!(url = %url, "Seed URL skipped after fetch failure");
    }
    for url in &report.misaligned_urls {
        tracing::warn!(url = %url, "Seed URL discarded for misaligned fields");
    }

    Ok(())
}

async fn open_store(cli: &Cli) -> Result<Arc<dyn VacancyStore>> {
    if cli.dry_run {
        tracing::info!("Dry run: records kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    }
    open_database(cli.database.clone()).await
}

#[cfg(feature = "sqlite")]
async fn open_database(database: Option<String>) -> Result<Arc<dyn VacancyStore>> {
    let database_url = database
        .or_else(|| std::env::var("VACANCY_DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://vacancies.db".to_string());

    tracing::info!(database = %database_url, "Opening SQLite store");
    let store = vacancy_extraction::SqliteStore::new(&database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_database(_database: Option<String>) -> Result<Arc<dyn VacancyStore>> {
    anyhow::bail!("built without the `sqlite` feature; use --dry-run")
}
