pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::task::JoinHandle;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::domain::Position;
use crate::preloader::{BackgroundPreload, MediaLoad};

use self::app::{Effect, Phase, TuiApp};
use self::event::{AppEvent, EventHandler, EventSender};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: Arc<AppContext>, config: Arc<Config>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, config).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>, config: Arc<Config>) -> Result<()> {
    let mut tui_app = TuiApp::new(config.playback.timing());
    let (mut events, tx) = EventHandler::new(Duration::from_millis(100));

    let mut loading = Some(spawn_load(&ctx, &config, tx.clone(), false));
    let mut background: Option<BackgroundPreload> = None;
    // At most one on-screen load, for the slide currently shown.
    let mut image_load: Option<MediaLoad> = None;

    loop {
        terminal.draw(|frame| {
            layout::render(frame, &mut tui_app, ctx.preloader.cache(), &config.colors)
        })?;

        match events.next(tui_app.controller.next_deadline())? {
            AppEvent::Key(key) => {
                tui_app.clear_status();
                let action = config.keybindings.get_action(&key);
                match tui_app.handle_action(action, Instant::now()) {
                    Some(Effect::Refresh) if !tui_app.is_refreshing => {
                        tui_app.is_refreshing = true;
                        if let Some(mut previous) = background.take() {
                            previous.abandon();
                        }
                        loading = Some(spawn_load(&ctx, &config, tx.clone(), true));
                    }
                    Some(Effect::OpenLink(link)) => {
                        if let Err(e) = open::that(&link) {
                            tui_app.set_status(format!("Failed to open browser: {}", e));
                        }
                    }
                    _ => {}
                }
            }
            AppEvent::Click(mouse) => {
                tui_app.handle_click(mouse.column, Instant::now());
            }
            AppEvent::StoriesLoaded(stories) => {
                tracing::debug!("Showing {} stories", stories.len());
                tui_app.set_stories(stories);
            }
            AppEvent::Preloaded { report, batch } => {
                tui_app.phase = Phase::Ready;
                if tui_app.is_refreshing {
                    tui_app.is_refreshing = false;
                    tui_app.set_status(format!(
                        "Refreshed: {} stories, {} media failed",
                        tui_app.stories().len(),
                        report.failed()
                    ));
                }
                background = Some(batch);
                loading = None;
            }
            AppEvent::RefreshFailed(reason) => {
                tui_app.is_refreshing = false;
                tui_app.set_status(format!("Refresh failed: {}", reason));
                loading = None;
            }
            AppEvent::ImageSettled {
                position,
                url,
                outcome,
            } => {
                tui_app.image_settled(position, &url, outcome);
            }
            AppEvent::Tick => {}
        }

        tui_app.controller.tick(Instant::now());
        if let Some((position, url)) = tui_app.take_load_request() {
            // Replacing the handle abandons the load for the previous slide.
            image_load = Some(spawn_image_load(&ctx, position, url, tx.clone()));
        } else if !tui_app.controller.is_open() {
            if let Some(mut load) = image_load.take() {
                load.abandon();
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    if let Some(task) = loading.take() {
        task.abort();
    }
    if let Some(mut batch) = background.take() {
        batch.abandon();
    }
    if let Some(mut load) = image_load.take() {
        load.abandon();
    }

    Ok(())
}

/// Resolve the collection, then run the awaited preload tier. The background
/// tier's handle is sent back with the result so the loop owns it.
fn spawn_load(
    ctx: &Arc<AppContext>,
    config: &Config,
    tx: EventSender,
    refresh: bool,
) -> JoinHandle<()> {
    let ctx = Arc::clone(ctx);
    let eager = config.preload.eager_stories;

    tokio::spawn(async move {
        let stories = if refresh {
            match ctx.repository.refresh().await {
                Ok(stories) => stories,
                Err(e) => {
                    tracing::warn!("Refresh failed: {}", e);
                    let _ = tx.send(AppEvent::RefreshFailed(e.to_string()));
                    return;
                }
            }
        } else {
            ctx.repository.load_stories().await
        };

        let _ = tx.send(AppEvent::StoriesLoaded(stories.clone()));
        let (report, batch) = ctx.preloader.preload_tiered(&stories, eager).await;
        // If the loop is gone the batch is dropped here, which aborts it.
        let _ = tx.send(AppEvent::Preloaded { report, batch });
    })
}

fn spawn_image_load(
    ctx: &Arc<AppContext>,
    position: Position,
    url: String,
    tx: EventSender,
) -> MediaLoad {
    let settled_url = url.clone();
    ctx.preloader.spawn_load_one(url, move |outcome| {
        let _ = tx.send(AppEvent::ImageSettled {
            position,
            url: settled_url,
            outcome,
        });
    })
}
