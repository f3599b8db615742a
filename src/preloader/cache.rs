use std::collections::HashMap;
use std::sync::RwLock;

/// What the viewer needs to know about a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Size of the encoded payload.
    pub bytes: usize,
}

/// Decoded media keyed by reference.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: RwLock<HashMap<String, ImageInfo>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<ImageInfo> {
        self.entries.read().ok()?.get(url).copied()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    pub fn insert(&self, url: &str, info: ImageInfo) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(url.to_string(), info);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
