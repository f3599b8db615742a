//! Time-boxed cache for the story collection.
//!
//! The persistent layout is two keys in the key-value [`Store`]: the
//! serialized collection and its expiry as epoch milliseconds. Anything that
//! fails to parse is reported as a miss.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::app::{Result, StoryreelError};
use crate::domain::Story;
use crate::store::Store;

pub const STORIES_KEY: &str = "cached_stories";
pub const EXPIRY_KEY: &str = "cached_stories_expiry";

/// A collection snapshot and the instant it stops being served.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub stories: Vec<Story>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(stories: Vec<Story>, expires_at: DateTime<Utc>) -> Self {
        Self {
            stories,
            expires_at,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

pub trait StoryCache: Send + Sync {
    /// Returns the stored entry, fresh or not. Corrupt data yields `None`.
    fn get(&self) -> Option<CacheEntry>;

    /// Replaces any previous entry.
    fn put(&self, entry: &CacheEntry) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// [`StoryCache`] backed by a key-value [`Store`].
pub struct PersistentCache<S> {
    store: Arc<S>,
}

impl<S: Store> PersistentCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn read(&self) -> Result<Option<CacheEntry>> {
        let (Some(raw_stories), Some(raw_expiry)) = (
            self.store.get_value(STORIES_KEY)?,
            self.store.get_value(EXPIRY_KEY)?,
        ) else {
            return Ok(None);
        };

        let millis: i64 = raw_expiry
            .trim()
            .parse()
            .map_err(|_| StoryreelError::Other(format!("bad expiry value {:?}", raw_expiry)))?;
        let expires_at = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| StoryreelError::Other(format!("expiry out of range: {}", millis)))?;

        let stories: Vec<Story> = serde_json::from_str(&raw_stories)?;
        if let Some(bad) = stories.iter().position(|s| !s.is_playable()) {
            return Err(StoryreelError::Other(format!(
                "cached story {} has no slides",
                bad
            )));
        }

        Ok(Some(CacheEntry::new(stories, expires_at)))
    }
}

impl<S: Store + Send + Sync> StoryCache for PersistentCache<S> {
    fn get(&self) -> Option<CacheEntry> {
        match self.read() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable story cache: {}", e);
                None
            }
        }
    }

    fn put(&self, entry: &CacheEntry) -> Result<()> {
        let stories = serde_json::to_string(&entry.stories)?;
        let expiry = entry.expires_at.timestamp_millis().to_string();
        self.store
            .set_values(&[(STORIES_KEY, stories.as_str()), (EXPIRY_KEY, expiry.as_str())])
    }

    fn clear(&self) -> Result<()> {
        self.store.delete_value(STORIES_KEY)?;
        self.store.delete_value(EXPIRY_KEY)
    }
}

/// In-process [`StoryCache`], handy as a test double.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(entry: CacheEntry) -> Self {
        Self {
            entry: Mutex::new(Some(entry)),
        }
    }
}

impl StoryCache for MemoryCache {
    fn get(&self) -> Option<CacheEntry> {
        self.entry.lock().ok().and_then(|guard| guard.clone())
    }

    fn put(&self, entry: &CacheEntry) -> Result<()> {
        let mut guard = self
            .entry
            .lock()
            .map_err(|e| StoryreelError::Other(e.to_string()))?;
        *guard = Some(entry.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .entry
            .lock()
            .map_err(|e| StoryreelError::Other(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}
