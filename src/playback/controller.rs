use std::time::{Duration, Instant};

use crate::domain::{PlaybackState, Position, Story};
use crate::playback::timer::{TimerArena, TimerKind, TimerToken};

pub const DEFAULT_ADVANCE_MS: u64 = 5_000;
pub const DEFAULT_TRANSITION_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// How long a slide stays on screen before auto-advance.
    pub advance_after: Duration,
    /// How long the transition flag stays raised.
    pub transition: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            advance_after: Duration::from_millis(DEFAULT_ADVANCE_MS),
            transition: Duration::from_millis(DEFAULT_TRANSITION_MS),
        }
    }
}

/// Which side of the viewport a pointer input landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerHalf {
    Left,
    Right,
}

impl PointerHalf {
    pub fn from_column(column: u16, width: u16) -> Self {
        if u32::from(column) * 2 < u32::from(width) {
            PointerHalf::Left
        } else {
            PointerHalf::Right
        }
    }
}

/// Raw viewer input, already stripped of any terminal specifics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerInput {
    Pointer(PointerHalf),
    NextStory,
    PrevStory,
    Cancel,
}

/// Owns the playback position and the timers scoped to it.
///
/// All methods run to completion on the caller's thread. Time is passed in
/// explicitly; the host loop calls [`PlaybackController::tick`] to fire
/// whatever timers have come due.
#[derive(Debug)]
pub struct PlaybackController {
    stories: Vec<Story>,
    state: PlaybackState,
    timers: TimerArena,
    timing: PlaybackTiming,
    image_loading: bool,
}

impl PlaybackController {
    pub fn new(stories: Vec<Story>, timing: PlaybackTiming) -> Self {
        Self {
            stories: Self::playable(stories),
            state: PlaybackState::Closed,
            timers: TimerArena::new(),
            timing,
            image_loading: false,
        }
    }

    fn playable(stories: Vec<Story>) -> Vec<Story> {
        let before = stories.len();
        let stories: Vec<Story> = stories.into_iter().filter(Story::is_playable).collect();
        if stories.len() != before {
            tracing::warn!("Dropped {} stories without slides", before - stories.len());
        }
        stories
    }

    /// Swap in a new collection. Closes the viewer.
    pub fn replace_stories(&mut self, stories: Vec<Story>) {
        self.close();
        self.stories = Self::playable(stories);
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> Option<Position> {
        self.state.position()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.is_transitioning()
    }

    pub fn current_story(&self) -> Option<&Story> {
        self.position().and_then(|p| self.stories.get(p.story))
    }

    pub fn current_slide(&self) -> Option<&str> {
        let position = self.position()?;
        self.stories.get(position.story)?.slide(position.image)
    }

    /// True until the slide at the current position settles.
    pub fn is_image_loading(&self) -> bool {
        self.is_open() && self.image_loading
    }

    pub fn timer(&self, kind: TimerKind) -> Option<TimerToken> {
        self.timers.token(kind)
    }

    pub fn timer_deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.timers.deadline(kind)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.live_count()
    }

    /// Open the viewer at `index`. Out-of-range indices are ignored.
    pub fn open(&mut self, index: usize, now: Instant) -> bool {
        if index >= self.stories.len() {
            tracing::warn!(
                "Ignoring open({}) with {} stories",
                index,
                self.stories.len()
            );
            return false;
        }
        self.enter(Position::new(index, 0), false, now);
        true
    }

    pub fn close(&mut self) {
        if self.state.is_open() {
            tracing::debug!("Closing viewer");
        }
        self.state = PlaybackState::Closed;
        self.timers.cancel_all();
        self.image_loading = false;
    }

    /// Manual forward step: next slide, or next story past the last one.
    pub fn advance_image(&mut self, now: Instant) {
        self.step_forward(now, true);
    }

    /// Manual backward step: previous slide, or previous story before the
    /// first one.
    pub fn retreat_image(&mut self, now: Instant) {
        let Some(position) = self.position() else {
            return;
        };
        if position.image > 0 {
            self.enter(Position::new(position.story, position.image - 1), true, now);
        } else {
            self.prev_story(now);
        }
    }

    pub fn next_story(&mut self, now: Instant) {
        let Some(position) = self.position() else {
            return;
        };
        if position.story + 1 < self.stories.len() {
            self.enter(Position::new(position.story + 1, 0), false, now);
        } else {
            self.close();
        }
    }

    pub fn prev_story(&mut self, now: Instant) {
        let Some(position) = self.position() else {
            return;
        };
        if position.story > 0 {
            self.enter(Position::new(position.story - 1, 0), false, now);
        } else {
            self.close();
        }
    }

    pub fn handle(&mut self, input: ViewerInput, now: Instant) {
        match input {
            ViewerInput::Pointer(PointerHalf::Left) => self.retreat_image(now),
            ViewerInput::Pointer(PointerHalf::Right) => self.advance_image(now),
            ViewerInput::NextStory => self.next_story(now),
            ViewerInput::PrevStory => self.prev_story(now),
            ViewerInput::Cancel => self.close(),
        }
    }

    /// Fire every timer due at `now`. Returns whether anything fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut fired = false;
        while let Some(token) = self.timers.pop_due(now) {
            self.dispatch(token, now);
            fired = true;
        }
        fired
    }

    /// Deliver a timer fire from outside. Stale tokens are ignored.
    pub fn fire(&mut self, token: TimerToken, now: Instant) -> bool {
        if !self.timers.claim(token) {
            tracing::debug!("Ignoring stale {:?} timer", token.kind);
            return false;
        }
        self.dispatch(token, now);
        true
    }

    /// Record that the slide at `position` finished loading. Failures count
    /// as loaded.
    pub fn image_settled(&mut self, position: Position) {
        if self.position() == Some(position) {
            self.image_loading = false;
        }
    }

    fn dispatch(&mut self, token: TimerToken, now: Instant) {
        match token.kind {
            TimerKind::Advance => {
                tracing::debug!("Auto-advance fired at {:?}", self.position());
                self.step_forward(now, false);
            }
            TimerKind::Transition => {
                if let PlaybackState::Open { position, .. } = self.state {
                    self.state = PlaybackState::Open {
                        position,
                        transitioning: false,
                    };
                }
            }
        }
    }

    fn step_forward(&mut self, now: Instant, manual: bool) {
        let Some(position) = self.position() else {
            return;
        };
        let slides = self.stories[position.story].slide_count();
        if position.image + 1 < slides {
            self.enter(Position::new(position.story, position.image + 1), manual, now);
        } else {
            self.next_story(now);
        }
    }

    fn enter(&mut self, position: Position, transitioning: bool, now: Instant) {
        self.state = PlaybackState::Open {
            position,
            transitioning,
        };
        self.image_loading = true;
        self.timers
            .schedule(TimerKind::Advance, now + self.timing.advance_after);
        if transitioning {
            self.timers
                .schedule(TimerKind::Transition, now + self.timing.transition);
        } else {
            self.timers.cancel(TimerKind::Transition);
        }
        tracing::debug!(
            "Playback at story {} image {}",
            position.story,
            position.image
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADVANCE: Duration = Duration::from_millis(DEFAULT_ADVANCE_MS);
    const FADE: Duration = Duration::from_millis(DEFAULT_TRANSITION_MS);

    fn story(slides: usize) -> Story {
        let mut story = Story::single("https://i.example.com/0.png", None, 0);
        story.preview = (0..slides)
            .map(|i| format!("https://i.example.com/{}.png", i))
            .collect();
        story
    }

    /// Story A with one slide, story B with two.
    fn controller() -> PlaybackController {
        PlaybackController::new(vec![story(1), story(2)], PlaybackTiming::default())
    }

    fn open(position: (usize, usize), transitioning: bool) -> PlaybackState {
        PlaybackState::Open {
            position: Position::new(position.0, position.1),
            transitioning,
        }
    }

    #[test]
    fn test_open_starts_at_first_slide() {
        let now = Instant::now();
        for i in 0..2 {
            let mut c = controller();
            assert!(c.open(i, now));
            assert_eq!(c.state(), open((i, 0), false));
            assert_eq!(c.timer_deadline(TimerKind::Advance), Some(now + ADVANCE));
        }
    }

    #[test]
    fn test_open_out_of_range_ignored() {
        let mut c = controller();
        assert!(!c.open(2, Instant::now()));
        assert_eq!(c.state(), PlaybackState::Closed);
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn test_auto_advance_crosses_to_next_story() {
        let now = Instant::now();
        let mut c = controller();
        c.open(0, now);

        assert!(!c.tick(now + ADVANCE - Duration::from_millis(1)));
        assert!(c.tick(now + ADVANCE));

        assert_eq!(c.position(), Some(Position::new(1, 0)));
        assert!(!c.is_transitioning());
    }

    #[test]
    fn test_auto_advance_within_story_does_not_fade() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);
        c.tick(now + ADVANCE);

        assert_eq!(c.state(), open((1, 1), false));
    }

    #[test]
    fn test_tap_right_advances_with_transition() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);

        let tap = now + Duration::from_secs(2);
        c.handle(ViewerInput::Pointer(PointerHalf::Right), tap);

        assert_eq!(c.state(), open((1, 1), true));
        assert_eq!(c.timer_deadline(TimerKind::Advance), Some(tap + ADVANCE));

        c.tick(tap + FADE - Duration::from_millis(1));
        assert!(c.is_transitioning());
        c.tick(tap + FADE);
        assert_eq!(c.state(), open((1, 1), false));
        // Countdown for the new slide is untouched by the fade timer.
        assert_eq!(c.timer_deadline(TimerKind::Advance), Some(tap + ADVANCE));
    }

    #[test]
    fn test_countdown_on_last_slide_of_last_story_closes() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);
        c.advance_image(now);
        assert_eq!(c.position(), Some(Position::new(1, 1)));

        c.tick(now + ADVANCE);

        assert_eq!(c.state(), PlaybackState::Closed);
        assert_eq!(c.pending_timers(), 0);
        assert!(!c.tick(now + ADVANCE * 10));
    }

    #[test]
    fn test_advance_on_last_slide_equals_next_story() {
        let now = Instant::now();
        let mut a = controller();
        let mut b = controller();
        a.open(0, now);
        b.open(0, now);

        a.advance_image(now);
        b.next_story(now);

        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn test_next_story_on_last_story_closes() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);
        c.next_story(now);
        assert_eq!(c.state(), PlaybackState::Closed);
    }

    #[test]
    fn test_retreat_on_first_slide_equals_prev_story() {
        let now = Instant::now();
        let mut a = controller();
        let mut b = controller();
        a.open(1, now);
        b.open(1, now);

        a.retreat_image(now);
        b.prev_story(now);

        assert_eq!(a.state(), open((0, 0), false));
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn test_prev_story_on_first_story_closes() {
        let now = Instant::now();
        let mut c = controller();
        c.open(0, now);
        c.handle(ViewerInput::Pointer(PointerHalf::Left), now);
        assert_eq!(c.state(), PlaybackState::Closed);
    }

    #[test]
    fn test_retreat_within_story_fades() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);
        c.advance_image(now);
        c.retreat_image(now);
        assert_eq!(c.state(), open((1, 0), true));
    }

    #[test]
    fn test_story_change_resets_image_index() {
        let now = Instant::now();
        let mut c = PlaybackController::new(
            vec![story(3), story(3)],
            PlaybackTiming::default(),
        );
        c.open(0, now);
        c.advance_image(now);
        c.advance_image(now);
        assert_eq!(c.position(), Some(Position::new(0, 2)));

        c.handle(ViewerInput::NextStory, now);
        assert_eq!(c.position(), Some(Position::new(1, 0)));

        c.advance_image(now);
        c.handle(ViewerInput::PrevStory, now);
        assert_eq!(c.position(), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_manual_navigation_restarts_countdown_once() {
        let now = Instant::now();
        let mut c = PlaybackController::new(vec![story(3)], PlaybackTiming::default());
        c.open(0, now);

        let tap = now + Duration::from_secs(4);
        c.advance_image(tap);

        // The countdown scheduled at open would have fired here.
        c.tick(now + ADVANCE);
        assert_eq!(c.position(), Some(Position::new(0, 1)));

        // Exactly one advance for the restarted countdown.
        c.tick(tap + ADVANCE);
        assert_eq!(c.position(), Some(Position::new(0, 2)));
    }

    #[test]
    fn test_stale_token_rejected() {
        let now = Instant::now();
        let mut c = controller();
        c.open(0, now);
        let stale = c.timer(TimerKind::Advance).unwrap();

        c.next_story(now);
        assert!(!c.fire(stale, now + ADVANCE));
        assert_eq!(c.position(), Some(Position::new(1, 0)));

        let live = c.timer(TimerKind::Advance).unwrap();
        assert!(c.fire(live, now));
        assert_eq!(c.position(), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_close_defuses_all_timers() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);
        c.advance_image(now);
        assert_eq!(c.pending_timers(), 2);
        let token = c.timer(TimerKind::Advance).unwrap();

        c.handle(ViewerInput::Cancel, now);

        assert_eq!(c.state(), PlaybackState::Closed);
        assert_eq!(c.pending_timers(), 0);
        assert!(!c.fire(token, now + ADVANCE));
        assert_eq!(c.state(), PlaybackState::Closed);
    }

    #[test]
    fn test_navigation_while_closed_is_noop() {
        let now = Instant::now();
        let mut c = controller();
        c.advance_image(now);
        c.retreat_image(now);
        c.next_story(now);
        c.prev_story(now);
        assert_eq!(c.state(), PlaybackState::Closed);
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn test_image_loading_gate() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);
        assert!(c.is_image_loading());

        // A late result for another slide does not clear the gate.
        c.image_settled(Position::new(0, 0));
        assert!(c.is_image_loading());

        c.image_settled(Position::new(1, 0));
        assert!(!c.is_image_loading());

        c.advance_image(now);
        assert!(c.is_image_loading());
    }

    #[test]
    fn test_slow_image_does_not_block_advance() {
        let now = Instant::now();
        let mut c = controller();
        c.open(0, now);
        assert!(c.is_image_loading());
        c.tick(now + ADVANCE);
        assert_eq!(c.position(), Some(Position::new(1, 0)));
    }

    #[test]
    fn test_replace_stories_closes_viewer() {
        let now = Instant::now();
        let mut c = controller();
        c.open(1, now);
        c.replace_stories(vec![story(1)]);
        assert_eq!(c.state(), PlaybackState::Closed);
        assert_eq!(c.stories().len(), 1);
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn test_unplayable_stories_dropped() {
        let mut empty = story(1);
        empty.preview.clear();
        let c = PlaybackController::new(vec![empty, story(2)], PlaybackTiming::default());
        assert_eq!(c.stories().len(), 1);
    }

    #[test]
    fn test_empty_collection() {
        let mut c = PlaybackController::new(Vec::new(), PlaybackTiming::default());
        assert!(!c.open(0, Instant::now()));
        assert!(c.current_story().is_none());
    }

    #[test]
    fn test_current_slide() {
        let now = Instant::now();
        let mut c = controller();
        assert_eq!(c.current_slide(), None);
        c.open(1, now);
        c.advance_image(now);
        assert_eq!(c.current_slide(), Some("https://i.example.com/1.png"));
    }

    #[test]
    fn test_pointer_half_from_column() {
        assert_eq!(PointerHalf::from_column(0, 80), PointerHalf::Left);
        assert_eq!(PointerHalf::from_column(39, 80), PointerHalf::Left);
        assert_eq!(PointerHalf::from_column(40, 80), PointerHalf::Right);
        assert_eq!(PointerHalf::from_column(79, 80), PointerHalf::Right);
        assert_eq!(PointerHalf::from_column(0, 0), PointerHalf::Right);
    }

    #[test]
    fn test_custom_timing() {
        let now = Instant::now();
        let timing = PlaybackTiming {
            advance_after: Duration::from_secs(1),
            transition: Duration::from_millis(100),
        };
        let mut c = PlaybackController::new(vec![story(2)], timing);
        c.open(0, now);
        c.tick(now + Duration::from_secs(1));
        assert_eq!(c.position(), Some(Position::new(0, 1)));
    }
}
