use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use crate::app::Result;
use crate::domain::{Position, Story};
use crate::preloader::{BackgroundPreload, LoadOutcome, PreloadReport};

pub enum AppEvent {
    Key(KeyEvent),
    /// Left button press anywhere on screen.
    Click(MouseEvent),
    Tick,
    /// Collection resolved, before any media is loaded.
    StoriesLoaded(Vec<Story>),
    /// Awaited tier has settled; `batch` is the background tier still running.
    Preloaded {
        report: PreloadReport,
        batch: BackgroundPreload,
    },
    ImageSettled {
        position: Position,
        url: String,
        outcome: LoadOutcome,
    },
    RefreshFailed(String),
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

/// Merges terminal input with events sent from background tasks.
pub struct EventHandler {
    tick_rate: Duration,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> (Self, EventSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tick_rate, rx }, tx)
    }

    /// Next event, waiting at most until `deadline` (or one tick).
    pub fn next(&mut self, deadline: Option<Instant>) -> Result<AppEvent> {
        if let Ok(event) = self.rx.try_recv() {
            return Ok(event);
        }

        let wait = deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .map_or(self.tick_rate, |d| d.min(self.tick_rate));

        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    return Ok(AppEvent::Key(key));
                }
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    return Ok(AppEvent::Click(mouse));
                }
                _ => {}
            }
        }
        Ok(AppEvent::Tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveLeft,
    MoveRight,
    Select,
    CloseViewer,
    NextImage,
    PrevImage,
    OpenInBrowser,
    Refresh,
    None,
}
