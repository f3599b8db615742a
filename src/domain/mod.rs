pub mod playback;
pub mod story;

pub use playback::{PlaybackState, Position};
pub use story::{Story, UNKNOWN_AUTHOR};
