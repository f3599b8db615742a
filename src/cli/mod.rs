pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "storyreel")]
#[command(about = "A terminal story viewer", long_about = None)]
pub struct Cli {
    /// Maximum number of media loads in flight (overrides config)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the story viewer (default)
    View,
    /// Print the current collection
    List,
    /// Fetch a fresh collection, ignoring the cache
    Refresh,
    /// Load the collection and preload all of its media
    Preload,
    /// Inspect or clear the story cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show whether a cached collection exists and when it expires
    Status,
    /// Remove the cached collection
    Clear,
}
