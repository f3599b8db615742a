//! Configuration management.
//!
//! Configuration is read from `~/.config/storyreel/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! Every section is optional; missing fields fall back to defaults.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::fetcher::http_fetcher::DEFAULT_TIMEOUT_SECS;
use crate::playback::{PlaybackTiming, DEFAULT_ADVANCE_MS, DEFAULT_TRANSITION_MS};
use crate::preloader::{DEFAULT_EAGER_STORIES, DEFAULT_MAX_CONCURRENCY};
use crate::repository::{DEFAULT_SOURCE_URL, DEFAULT_TTL_MINUTES};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub playback: PlaybackConfig,
    pub preload: PreloadConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

/// Where the story collection comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes.max(0))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub advance_ms: u64,
    pub transition_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            advance_ms: DEFAULT_ADVANCE_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

impl PlaybackConfig {
    pub fn timing(&self) -> PlaybackTiming {
        PlaybackTiming {
            advance_after: Duration::from_millis(self.advance_ms.max(1)),
            transition: Duration::from_millis(self.transition_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// Stories whose media is awaited before the strip is shown.
    pub eager_stories: usize,
    pub max_concurrency: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            eager_stories: DEFAULT_EAGER_STORIES,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating a commented
    /// default file first if none exists.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("storyreel").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, Self::default_config_content()).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn default_config_content() -> &'static str {
        r##"# Storyreel configuration
#
# Colors can be named (Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray,
# DarkGray, LightRed, LightGreen, LightYellow, LightBlue, LightMagenta,
# LightCyan, White, Reset) or hex ("#RRGGBB" / "#RGB").
#
# Keys can be single characters ("a", "R"), special keys (Enter, Esc, Space,
# Tab, Backspace, Left, Right, Up, Down, PageUp, PageDown, F1-F12) or
# combinations ("Ctrl+c", "Alt+Enter").

[source]
url = "https://meme-api.com/gimme/39"
timeout_secs = 10

[cache]
# How long a fetched collection is served before refetching
ttl_minutes = 30

[playback]
# Time each slide stays up before auto-advancing
advance_ms = 5000
# Length of the fade after a manual step
transition_ms = 500

[preload]
# Stories whose images are loaded before the strip appears
eager_stories = 3
max_concurrency = 8

[colors]
active_border = "Magenta"
inactive_border = "DarkGray"
selection_bg = "Magenta"
selection_fg = "Black"
author = "Yellow"
ups = "LightRed"
progress_done = "White"
progress_current = "LightMagenta"
progress_pending = "DarkGray"
loading = "Cyan"
faded = "DarkGray"
status_fg = "White"
status_bg = "DarkGray"

[keybindings]
quit = ["q", "Ctrl+c"]
move_left = ["h", "Left"]
move_right = ["l", "Right"]
select = ["Enter"]
close_viewer = ["Esc"]
next_image = ["Space", "j"]
prev_image = ["Backspace", "k"]
open_in_browser = ["o"]
refresh = ["R"]
"##
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
