/// A (story, slide) pair inside an open viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub story: usize,
    pub image: usize,
}

impl Position {
    pub fn new(story: usize, image: usize) -> Self {
        Self { story, image }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Closed,
    Open {
        position: Position,
        transitioning: bool,
    },
}

impl PlaybackState {
    pub fn position(&self) -> Option<Position> {
        match self {
            PlaybackState::Closed => None,
            PlaybackState::Open { position, .. } => Some(*position),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PlaybackState::Open { .. })
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(
            self,
            PlaybackState::Open {
                transitioning: true,
                ..
            }
        )
    }
}
