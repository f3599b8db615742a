//! Generation-stamped timer slots.
//!
//! Each [`TimerKind`] owns at most one slot. Scheduling a kind replaces its
//! slot and bumps the generation, so a token issued for an earlier slot can
//! never be claimed again.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Auto-advance countdown for the current position.
    Advance,
    /// Clears the transition flag.
    Transition,
}

impl TimerKind {
    fn slot(self) -> usize {
        match self {
            TimerKind::Advance => 0,
            TimerKind::Transition => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    token: TimerToken,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct TimerArena {
    slots: [Option<Slot>; 2],
    next_generation: u64,
}

impl TimerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire at `deadline`, defusing whatever it held before.
    pub fn schedule(&mut self, kind: TimerKind, deadline: Instant) -> TimerToken {
        self.next_generation += 1;
        let token = TimerToken {
            kind,
            generation: self.next_generation,
        };
        self.slots[kind.slot()] = Some(Slot { token, deadline });
        token
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].take().is_some()
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None, None];
    }

    pub fn is_live(&self, token: TimerToken) -> bool {
        self.slots[token.kind.slot()].is_some_and(|slot| slot.token == token)
    }

    /// Remove the slot if `token` still owns it.
    pub fn claim(&mut self, token: TimerToken) -> bool {
        if self.is_live(token) {
            self.slots[token.kind.slot()] = None;
            true
        } else {
            false
        }
    }

    pub fn token(&self, kind: TimerKind) -> Option<TimerToken> {
        self.slots[kind.slot()].map(|slot| slot.token)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.slots[kind.slot()].map(|slot| slot.deadline)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|slot| slot.deadline).min()
    }

    /// Take the earliest slot whose deadline has passed.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerToken> {
        let due = self
            .slots
            .iter()
            .flatten()
            .filter(|slot| slot.deadline <= now)
            .min_by_key(|slot| slot.deadline)
            .map(|slot| slot.token)?;
        self.slots[due.kind.slot()] = None;
        Some(due)
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
