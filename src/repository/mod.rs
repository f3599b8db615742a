//! Read-through, write-through access to the story collection.

use std::sync::Arc;

use chrono::Duration;

use crate::app::Result;
use crate::cache::{CacheEntry, StoryCache};
use crate::clock::Clock;
use crate::domain::Story;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;

pub const DEFAULT_SOURCE_URL: &str = "https://meme-api.com/gimme/39";
pub const DEFAULT_TTL_MINUTES: i64 = 30;

pub struct StoryRepository {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    cache: Arc<dyn StoryCache>,
    clock: Arc<dyn Clock>,
    normalizer: Normalizer,
    source_url: String,
    ttl: Duration,
}

impl StoryRepository {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        cache: Arc<dyn StoryCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            clock,
            normalizer: Normalizer::new(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Load the collection, serving the cache while it is fresh.
    ///
    /// Never fails: any fetch or normalization error is logged and an empty
    /// collection returned, leaving the previous cache entry in place.
    pub async fn load_stories(&self) -> Vec<Story> {
        let now = self.clock.now();

        if let Some(entry) = self.cache.get() {
            if entry.is_fresh(now) {
                tracing::debug!(
                    "Serving {} stories from cache (expires {})",
                    entry.stories.len(),
                    entry.expires_at
                );
                return entry.stories;
            }
            tracing::debug!("Story cache expired at {}", entry.expires_at);
        }

        match self.fetch_and_store().await {
            Ok(stories) => stories,
            Err(e) => {
                tracing::warn!("Failed to load stories from {}: {}", self.source_url, e);
                Vec::new()
            }
        }
    }

    /// Fetch from upstream regardless of cache freshness.
    pub async fn refresh(&self) -> Result<Vec<Story>> {
        self.fetch_and_store().await
    }

    /// The stored entry, if one parses, whether or not it is fresh.
    pub fn cached_entry(&self) -> Option<CacheEntry> {
        self.cache.get()
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    async fn fetch_and_store(&self) -> Result<Vec<Story>> {
        let body = self.fetcher.fetch(&self.source_url).await?;
        let stories = self.normalizer.normalize(&body)?;
        tracing::info!("Fetched {} stories from {}", stories.len(), self.source_url);

        // Expiry is stamped after the fetch completes.
        let entry = CacheEntry::new(stories, self.clock.now() + self.ttl);
        if let Err(e) = self.cache.put(&entry) {
            tracing::warn!("Failed to write story cache: {}", e);
        }

        Ok(entry.stories)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::app::StoryreelError;
    use crate::cache::MemoryCache;
    use crate::clock::FixedClock;

    const BODY: &str = r#"{"memes": [
        {"url": "https://i.example.com/1.png", "author": "alice", "ups": 5},
        {"url": "https://i.example.com/2.png", "ups": 9}
    ]}"#;

    /// Replays canned responses and counts calls.
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: Mutex<VecDeque<Result<Vec<u8>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn with(responses: Vec<Result<Vec<u8>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StoryreelError::Other("no more responses".into())))
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn repo_at(
        fetcher: &Arc<ScriptedFetcher>,
        cache: &Arc<MemoryCache>,
        now: DateTime<Utc>,
    ) -> StoryRepository {
        StoryRepository::new(fetcher.clone(), cache.clone(), Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn test_miss_fetches_and_writes_entry() {
        let fetcher = ScriptedFetcher::with(vec![Ok(BODY.as_bytes().to_vec())]);
        let cache = Arc::new(MemoryCache::new());

        let stories = repo_at(&fetcher, &cache, t0()).load_stories().await;

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[1].author, "Unknown");
        assert_eq!(fetcher.calls(), 1);
        let entry = cache.get().unwrap();
        assert_eq!(entry.stories, stories);
        assert_eq!(entry.expires_at, t0() + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_fresh_entry_served_without_network() {
        let fetcher = ScriptedFetcher::with(vec![Ok(BODY.as_bytes().to_vec())]);
        let cache = Arc::new(MemoryCache::new());

        repo_at(&fetcher, &cache, t0()).load_stories().await;
        let just_before = t0() + Duration::minutes(30) - Duration::milliseconds(1);
        let stories = repo_at(&fetcher, &cache, just_before).load_stories().await;

        assert_eq!(stories.len(), 2);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_expiry_boundary_refetches() {
        let fetcher = ScriptedFetcher::with(vec![
            Ok(BODY.as_bytes().to_vec()),
            Ok(br#"{"memes": [{"url": "https://i.example.com/3.png"}]}"#.to_vec()),
        ]);
        let cache = Arc::new(MemoryCache::new());

        repo_at(&fetcher, &cache, t0()).load_stories().await;
        let at_expiry = t0() + Duration::minutes(30);
        let stories = repo_at(&fetcher, &cache, at_expiry).load_stories().await;

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(stories.len(), 1);
        assert_eq!(cache.get().unwrap().expires_at, at_expiry + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_stale_entry_bypassed() {
        let now = t0();
        let stale = CacheEntry::new(
            vec![Story::single("https://i.example.com/old.png", None, 0)],
            now - Duration::milliseconds(1),
        );
        let cache = Arc::new(MemoryCache::with_entry(stale));
        let fetcher = ScriptedFetcher::with(vec![Ok(BODY.as_bytes().to_vec())]);

        let stories = repo_at(&fetcher, &cache, now).load_stories().await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(stories[0].url, "https://i.example.com/1.png");
        assert_eq!(cache.get().unwrap().expires_at, now + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_network_error_returns_empty_and_keeps_entry() {
        let now = t0();
        let stale = CacheEntry::new(
            vec![Story::single("https://i.example.com/old.png", None, 0)],
            now - Duration::minutes(1),
        );
        let cache = Arc::new(MemoryCache::with_entry(stale.clone()));
        let fetcher = ScriptedFetcher::with(vec![Err(StoryreelError::Other("offline".into()))]);

        let stories = repo_at(&fetcher, &cache, now).load_stories().await;

        assert!(stories.is_empty());
        assert_eq!(cache.get(), Some(stale));
    }

    #[tokio::test]
    async fn test_normalization_error_returns_empty_and_writes_nothing() {
        let cache = Arc::new(MemoryCache::new());
        let fetcher = ScriptedFetcher::with(vec![Ok(br#"{"memes": [{"ups": 1}]}"#.to_vec())]);

        let stories = repo_at(&fetcher, &cache, t0()).load_stories().await;

        assert!(stories.is_empty());
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn test_refresh_ignores_fresh_entry() {
        let fetcher = ScriptedFetcher::with(vec![
            Ok(BODY.as_bytes().to_vec()),
            Ok(BODY.as_bytes().to_vec()),
        ]);
        let cache = Arc::new(MemoryCache::new());
        let repo = repo_at(&fetcher, &cache, t0());

        repo.load_stories().await;
        repo.refresh().await.unwrap();

        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_propagates_errors() {
        let fetcher = ScriptedFetcher::with(vec![Err(StoryreelError::Other("offline".into()))]);
        let cache = Arc::new(MemoryCache::new());

        let result = repo_at(&fetcher, &cache, t0()).refresh().await;
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_ttl() {
        let fetcher = ScriptedFetcher::with(vec![Ok(BODY.as_bytes().to_vec())]);
        let cache = Arc::new(MemoryCache::new());
        let repo = repo_at(&fetcher, &cache, t0()).with_ttl(Duration::minutes(5));

        tokio_test::block_on(repo.load_stories());

        assert_eq!(repo.ttl(), Duration::minutes(5));
        assert_eq!(cache.get().unwrap().expires_at, t0() + Duration::minutes(5));
    }
}
