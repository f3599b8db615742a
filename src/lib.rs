//! # Storyreel
//!
//! A terminal viewer for short-lived image stories.
//!
//! ## Architecture
//!
//! Storyreel follows a pipeline architecture:
//!
//! ```text
//! Fetcher → Normalizer → Repository (cache over Store) → Preloader → Playback → UI
//! ```
//!
//! - [`fetcher`]: HTTP client for the story source and media
//! - [`normalizer`]: Converts the upstream JSON into [`Story`](domain::Story) values
//! - [`repository`]: Cache-first access to the collection
//! - [`preloader`]: Concurrent all-settle media loading
//! - [`playback`]: Viewer state machine with generation-checked timers
//! - [`tui`]: Terminal user interface built with ratatui
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the viewer
//! storyreel
//!
//! # Print the collection
//! storyreel list
//!
//! # Bypass the cache
//! storyreel refresh
//!
//! # Inspect the cache
//! storyreel cache status
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct builds the store and fetcher
/// and hands out the repository and preloader wired over them.
pub mod app;

/// Story collection cache.
///
/// - [`StoryCache`](cache::StoryCache): get/put/clear of one [`CacheEntry`](cache::CacheEntry)
/// - [`PersistentCache`](cache::PersistentCache): entry kept under two keys of a [`Store`](store::Store)
/// - [`MemoryCache`](cache::MemoryCache): in-process implementation
pub mod cache;

/// Command-line interface using clap.
///
/// - `view` (default) - Launch the TUI
/// - `list` - Print the collection
/// - `refresh` - Fetch ignoring the cache
/// - `preload` - Load all media and report
/// - `cache status|clear` - Inspect or drop the cached collection
pub mod cli;

/// Injectable wall clock for cache expiry.
pub mod clock;

/// Configuration loaded from `~/.config/storyreel/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Story`](domain::Story): one author's slides
/// - [`PlaybackState`](domain::PlaybackState): closed, or open at a [`Position`](domain::Position)
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait returning raw bytes
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Upstream JSON normalization.
pub mod normalizer;

/// Viewer state machine.
pub mod playback;

/// Media preloading.
pub mod preloader;

/// Read-through, write-through story loading.
pub mod repository;

/// SQLite key-value persistence.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Terminal user interface.
///
/// Story strip plus a full-screen viewer. Keybindings: h/l move, Enter
/// plays, Space/Backspace step slides, clicks tap the left or right half,
/// Esc closes, o opens the post, R refreshes, q quits.
pub mod tui;
