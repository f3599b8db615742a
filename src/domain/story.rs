use serde::{Deserialize, Serialize};

/// Author name used when the upstream record carries none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Primary media reference, doubles as the author avatar.
    pub url: String,
    /// Slides shown for this story. Never empty.
    pub preview: Vec<String>,
    pub author: String,
    pub ups: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Story {
    /// Build a single-slide story from one media URL.
    pub fn single(url: impl Into<String>, author: Option<String>, ups: i64) -> Self {
        let url = url.into();
        Self {
            preview: vec![url.clone()],
            url,
            author: author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            ups,
            title: None,
            link: None,
        }
    }

    pub fn slide_count(&self) -> usize {
        self.preview.len()
    }

    pub fn slide(&self, index: usize) -> Option<&str> {
        self.preview.get(index).map(String::as_str)
    }

    /// First slide, used for the thumbnail strip.
    pub fn lead(&self) -> &str {
        self.preview.first().map(String::as_str).unwrap_or(&self.url)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Upholds the non-empty `preview` invariant.
    pub fn is_playable(&self) -> bool {
        !self.preview.is_empty()
    }
}
