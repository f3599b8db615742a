//! Media preloading.
//!
//! Every reference is loaded independently; a batch resolves once all of its
//! members have settled, successful or not. Startup is split in two tiers:
//! the first few stories are awaited, the rest stream in on a background task
//! that can be abandoned at any time.
//!
//! ```text
//! refs → Preloader → MediaLoader (fetch + decode) → ImageCache
//! ```

mod cache;
mod loader;

pub use cache::{ImageCache, ImageInfo};
pub use loader::{HttpMediaLoader, MediaLoader};

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::Story;

pub const DEFAULT_EAGER_STORIES: usize = 3;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(ImageInfo),
    Failed(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

/// Final state of one reference in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub url: String,
    pub outcome: LoadOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct PreloadReport {
    pub settled: Vec<Settled>,
}

impl PreloadReport {
    pub fn total(&self) -> usize {
        self.settled.len()
    }

    pub fn loaded(&self) -> usize {
        self.settled.iter().filter(|s| s.outcome.is_loaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.loaded()
    }
}

/// Split the slides of a collection into the awaited tier (first `eager`
/// stories) and the background tier (everything after).
pub fn split_tiers(stories: &[Story], eager: usize) -> (Vec<String>, Vec<String>) {
    let split = eager.min(stories.len());
    let collect = |slice: &[Story]| {
        slice
            .iter()
            .flat_map(|story| story.preview.iter().cloned())
            .collect::<Vec<_>>()
    };
    (collect(&stories[..split]), collect(&stories[split..]))
}

pub struct Preloader {
    loader: Arc<dyn MediaLoader>,
    cache: Arc<ImageCache>,
    semaphore: Arc<Semaphore>,
}

impl Preloader {
    pub fn new(loader: Arc<dyn MediaLoader>, cache: Arc<ImageCache>) -> Self {
        Self::with_concurrency(loader, cache, DEFAULT_MAX_CONCURRENCY)
    }

    pub fn with_concurrency(
        loader: Arc<dyn MediaLoader>,
        cache: Arc<ImageCache>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            loader,
            cache,
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// Load a single reference, answering from the image cache when possible.
    pub async fn load_one(&self, url: &str) -> LoadOutcome {
        if let Some(info) = self.cache.get(url) {
            return LoadOutcome::Loaded(info);
        }

        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => return LoadOutcome::Failed(e.to_string()),
        };

        match self.loader.load(url).await {
            Ok(info) => {
                self.cache.insert(url, info);
                LoadOutcome::Loaded(info)
            }
            Err(e) => {
                tracing::warn!("Failed to load media {}: {}", url, e);
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Load every reference concurrently and wait until all have settled.
    pub async fn preload(&self, refs: Vec<String>) -> PreloadReport {
        let settled = join_all(refs.into_iter().map(|url| async move {
            let outcome = self.load_one(&url).await;
            Settled { url, outcome }
        }))
        .await;

        let report = PreloadReport { settled };
        tracing::info!(
            "Preloaded {} media ({} failed)",
            report.loaded(),
            report.failed()
        );
        report
    }

    /// Run [`Preloader::preload`] on a background task.
    pub fn spawn_preload(self: &Arc<Self>, refs: Vec<String>) -> BackgroundPreload {
        let preloader = Arc::clone(self);
        let handle = tokio::spawn(async move { preloader.preload(refs).await });
        BackgroundPreload {
            handle: Some(handle),
        }
    }

    /// Load one reference on its own task and pass the outcome to
    /// `on_settled`. Dropping the returned handle aborts the load, releasing
    /// its permit, and `on_settled` is then never called.
    pub fn spawn_load_one<F>(self: &Arc<Self>, url: String, on_settled: F) -> MediaLoad
    where
        F: FnOnce(LoadOutcome) + Send + 'static,
    {
        let preloader = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = preloader.load_one(&url).await;
            on_settled(outcome);
        });
        MediaLoad {
            handle: Some(handle),
        }
    }

    /// Await the first `eager` stories, then hand the rest to a background
    /// task.
    pub async fn preload_tiered(
        self: &Arc<Self>,
        stories: &[Story],
        eager: usize,
    ) -> (PreloadReport, BackgroundPreload) {
        let (blocking, background) = split_tiers(stories, eager);
        let report = self.preload(blocking).await;
        (report, self.spawn_preload(background))
    }
}

/// Handle to a fire-and-forget batch. Dropping it abandons the batch.
pub struct BackgroundPreload {
    handle: Option<JoinHandle<PreloadReport>>,
}

impl BackgroundPreload {
    /// Stop waiting on in-flight loads. Already cached media stays cached.
    pub fn abandon(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the batch. `None` if it was abandoned or the task failed.
    pub async fn join(mut self) -> Option<PreloadReport> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::error!("Background preload task failed: {}", e);
                }
                None
            }
        }
    }
}

impl Drop for BackgroundPreload {
    fn drop(&mut self) {
        self.abandon();
    }
}

/// Handle to a single on-screen load. Dropping it abandons the load.
pub struct MediaLoad {
    handle: Option<JoinHandle<()>>,
}

impl MediaLoad {
    pub fn abandon(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for MediaLoad {
    fn drop(&mut self) {
        self.abandon();
    }
}
