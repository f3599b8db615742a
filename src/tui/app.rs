use std::time::Instant;

use crate::domain::{Position, Story};
use crate::playback::{PlaybackController, PlaybackTiming, PointerHalf, ViewerInput};
use crate::preloader::LoadOutcome;
use crate::tui::event::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the collection and the awaited preload tier.
    Loading,
    Ready,
}

/// Side effects the event loop carries out on behalf of the app state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Refresh,
    OpenLink(String),
}

pub struct TuiApp {
    pub phase: Phase,
    pub controller: PlaybackController,
    /// Story highlighted in the strip.
    pub selected: usize,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub is_refreshing: bool,
    /// Last known frame width, used to split clicks into halves.
    pub screen_width: u16,
    requested: Option<Position>,
    slide: Option<(Position, LoadOutcome)>,
}

impl TuiApp {
    pub fn new(timing: PlaybackTiming) -> Self {
        Self {
            phase: Phase::Loading,
            controller: PlaybackController::new(Vec::new(), timing),
            selected: 0,
            should_quit: false,
            status_message: None,
            is_refreshing: false,
            screen_width: 0,
            requested: None,
            slide: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn stories(&self) -> &[Story] {
        self.controller.stories()
    }

    pub fn selected_story(&self) -> Option<&Story> {
        self.stories().get(self.selected)
    }

    pub fn set_stories(&mut self, stories: Vec<Story>) {
        self.controller.replace_stories(stories);
        self.selected = self.selected.min(self.stories().len().saturating_sub(1));
        self.requested = None;
        self.slide = None;
    }

    pub fn move_left(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.selected + 1 < self.stories().len() {
            self.selected += 1;
        }
    }

    /// Outcome of the slide on screen, once it has settled.
    pub fn current_outcome(&self) -> Option<&LoadOutcome> {
        let position = self.controller.position()?;
        self.slide
            .as_ref()
            .filter(|(settled, _)| *settled == position)
            .map(|(_, outcome)| outcome)
    }

    /// Results are matched on both position and reference, so a load for a
    /// slide that has since been replaced at the same position is dropped.
    pub fn image_settled(&mut self, position: Position, url: &str, outcome: LoadOutcome) {
        if self.controller.position() != Some(position)
            || self.controller.current_slide() != Some(url)
        {
            tracing::debug!("Dropping stale load result for {}", url);
            return;
        }
        self.controller.image_settled(position);
        self.slide = Some((position, outcome));
    }

    /// Returns the position and media reference to load whenever the viewer
    /// lands somewhere new. Also keeps the strip selection on the story
    /// being played.
    pub fn take_load_request(&mut self) -> Option<(Position, String)> {
        let position = self.controller.position();
        if let Some(p) = position {
            self.selected = p.story;
        }
        if position == self.requested {
            return None;
        }
        self.requested = position;
        let url = self.controller.current_slide()?.to_string();
        position.map(|p| (p, url))
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) -> Option<Effect> {
        if action == Action::Quit {
            self.should_quit = true;
            return None;
        }
        if self.is_loading() {
            return None;
        }

        if self.controller.is_open() {
            let input = match action {
                Action::CloseViewer => ViewerInput::Cancel,
                Action::MoveLeft => ViewerInput::PrevStory,
                Action::MoveRight => ViewerInput::NextStory,
                Action::NextImage => ViewerInput::Pointer(PointerHalf::Right),
                Action::PrevImage => ViewerInput::Pointer(PointerHalf::Left),
                Action::OpenInBrowser => {
                    return self.controller.current_story().map(link_effect);
                }
                Action::Refresh => return Some(Effect::Refresh),
                Action::Select | Action::Quit | Action::None => return None,
            };
            self.controller.handle(input, now);
            return None;
        }

        match action {
            Action::MoveLeft => self.move_left(),
            Action::MoveRight => self.move_right(),
            Action::Select => {
                self.controller.open(self.selected, now);
            }
            Action::OpenInBrowser => return self.selected_story().map(link_effect),
            Action::Refresh => return Some(Effect::Refresh),
            _ => {}
        }
        None
    }

    /// Clicks only matter inside the viewer, where each half of the screen
    /// is a tap target.
    pub fn handle_click(&mut self, column: u16, now: Instant) {
        if self.controller.is_open() {
            let half = PointerHalf::from_column(column, self.screen_width);
            self.controller.handle(ViewerInput::Pointer(half), now);
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

fn link_effect(story: &Story) -> Effect {
    Effect::OpenLink(story.link.clone().unwrap_or_else(|| story.url.clone()))
}
