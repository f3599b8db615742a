use chrono::{DateTime, Local, Utc};

use crate::app::{AppContext, Result};
use crate::cache::CacheEntry;
use crate::domain::Story;

pub async fn list_stories(ctx: &AppContext) -> Result<()> {
    let stories = ctx.repository.load_stories().await;

    if stories.is_empty() {
        println!("No stories");
        return Ok(());
    }

    for (i, story) in stories.iter().enumerate() {
        println!("{:>3}. {}", i + 1, describe_story(story));
    }

    Ok(())
}

pub async fn refresh_stories(ctx: &AppContext) -> Result<()> {
    let stories = ctx.repository.refresh().await?;
    println!(
        "Fetched {} stories (cached for {} minutes)",
        stories.len(),
        ctx.repository.ttl().num_minutes()
    );
    Ok(())
}

/// Run both preload tiers to completion and report what settled.
pub async fn preload_media(ctx: &AppContext, eager: usize) -> Result<()> {
    let stories = ctx.repository.load_stories().await;

    if stories.is_empty() {
        println!("No stories to preload");
        return Ok(());
    }

    println!("Preloading media for {} stories...", stories.len());

    let (blocking, background) = ctx.preloader.preload_tiered(&stories, eager).await;
    println!(
        "  first {} stories: {} loaded, {} failed",
        eager.min(stories.len()),
        blocking.loaded(),
        blocking.failed()
    );

    let rest = background.join().await.unwrap_or_default();
    println!(
        "  remaining stories: {} loaded, {} failed",
        rest.loaded(),
        rest.failed()
    );

    for settled in blocking.settled.iter().chain(rest.settled.iter()) {
        if !settled.outcome.is_loaded() {
            eprintln!("  ! {}", settled.url);
        }
    }

    println!(
        "Preload complete: {} loaded, {} failed",
        blocking.loaded() + rest.loaded(),
        blocking.failed() + rest.failed()
    );
    Ok(())
}

pub fn cache_status(ctx: &AppContext) -> Result<()> {
    match ctx.repository.cached_entry() {
        Some(entry) => println!("{}", describe_entry(&entry, Utc::now())),
        None => println!("No cached stories"),
    }
    Ok(())
}

pub fn clear_cache(ctx: &AppContext) -> Result<()> {
    ctx.repository.clear_cache()?;
    println!("Cleared story cache");
    Ok(())
}

fn describe_story(story: &Story) -> String {
    format!(
        "{} (▲ {}, {} slide{})\n     {}",
        story.author,
        story.ups,
        story.slide_count(),
        if story.slide_count() == 1 { "" } else { "s" },
        story.url
    )
}

fn describe_entry(entry: &CacheEntry, now: DateTime<Utc>) -> String {
    let state = if entry.is_fresh(now) { "fresh" } else { "expired" };
    format!(
        "{} cached stories, {} (expires {})",
        entry.stories.len(),
        state,
        entry
            .expires_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    )
}
