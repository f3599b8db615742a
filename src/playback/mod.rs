//! Story playback state machine.
//!
//! [`PlaybackController`] is either closed or open at a (story, slide)
//! position. Opening or moving to a position arms a single auto-advance
//! countdown for it; manual intra-story steps additionally raise a short
//! transition flag with its own timer. Timers live in a [`TimerArena`] and
//! are stamped with a generation so a fire aimed at an old position is
//! dropped.

mod controller;
mod timer;

pub use controller::{
    PlaybackController, PlaybackTiming, PointerHalf, ViewerInput, DEFAULT_ADVANCE_MS,
    DEFAULT_TRANSITION_MS,
};
pub use timer::{TimerArena, TimerKind, TimerToken};
