use std::sync::Arc;

use async_trait::async_trait;
use image::GenericImageView;

use crate::app::{Result, StoryreelError};
use crate::fetcher::Fetcher;
use crate::preloader::ImageInfo;

/// Fetches and decodes one media reference.
#[async_trait]
pub trait MediaLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<ImageInfo>;
}

/// Downloads media with a [`Fetcher`] and decodes it off the async runtime.
pub struct HttpMediaLoader {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl HttpMediaLoader {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl MediaLoader for HttpMediaLoader {
    async fn load(&self, url: &str) -> Result<ImageInfo> {
        let body = self.fetcher.fetch(url).await?;
        let bytes = body.len();

        let (width, height) = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&body).map(|img| img.dimensions())
        })
        .await
        .map_err(|e| StoryreelError::Other(format!("decode task failed: {}", e)))??;

        Ok(ImageInfo {
            width,
            height,
            bytes,
        })
    }
}
