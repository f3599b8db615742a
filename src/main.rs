use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storyreel::app::AppContext;
use storyreel::cli::{commands, CacheAction, Cli, Commands};
use storyreel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::View);

    // The TUI owns the terminal, so its logs go to a file.
    init_tracing(matches!(command, Commands::View))?;

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using default configuration.", e);
        Config::default()
    });
    let ctx = AppContext::new(&config, cli.workers)?;

    match command {
        Commands::View => {
            storyreel::tui::run(Arc::new(ctx), Arc::new(config)).await?;
        }
        Commands::List => {
            commands::list_stories(&ctx).await?;
        }
        Commands::Refresh => {
            commands::refresh_stories(&ctx).await?;
        }
        Commands::Preload => {
            commands::preload_media(&ctx, config.preload.eager_stories).await?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Status => commands::cache_status(&ctx)?,
            CacheAction::Clear => commands::clear_cache(&ctx)?,
        },
    }

    Ok(())
}

fn init_tracing(to_file: bool) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if to_file {
        let path = AppContext::data_dir()?.join("storyreel.log");
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        registry
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init();
    } else {
        registry.with(fmt::layer()).init();
    }

    Ok(())
}
