use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app::error::{Result, StoryreelError};
use crate::cache::{PersistentCache, StoryCache};
use crate::clock::SystemClock;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::preloader::{HttpMediaLoader, ImageCache, Preloader};
use crate::repository::StoryRepository;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub repository: StoryRepository,
    pub preloader: Arc<Preloader>,
}

impl AppContext {
    /// Wire everything against the on-disk store. `workers` overrides the
    /// configured preload concurrency.
    pub fn new(config: &Config, workers: Option<usize>) -> Result<Self> {
        let db_path = Self::data_dir()?.join("storyreel.db");
        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(store, config, workers)
    }

    pub fn in_memory(config: &Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(store, config, None)
    }

    fn with_store(store: Arc<SqliteStore>, config: &Config, workers: Option<usize>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_timeout(
            Duration::from_secs(config.source.timeout_secs),
        )?);

        let cache: Arc<dyn StoryCache> = Arc::new(PersistentCache::new(store));
        let repository = StoryRepository::new(fetcher.clone(), cache, Arc::new(SystemClock))
            .with_source_url(config.source.url.as_str())
            .with_ttl(config.cache.ttl());

        let preloader = Arc::new(Preloader::with_concurrency(
            Arc::new(HttpMediaLoader::new(fetcher)),
            Arc::new(ImageCache::new()),
            workers.unwrap_or(config.preload.max_concurrency),
        ));

        Ok(Self {
            repository,
            preloader,
        })
    }

    /// `<data dir>/storyreel`, created on first use. Holds the database and
    /// the TUI log file.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| StoryreelError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("storyreel");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir)
    }
}
