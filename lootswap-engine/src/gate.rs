//! Debounced per-frame gate deciding when item delivery may interrupt the
//! controlled character.

use serde::{Deserialize, Serialize};

/// Consecutive idle frames required before the gate fires.
pub const REQUIRED_IDLE_FRAMES: u8 = 2;

/// Snapshot of the controlled character's status flags, constructed by the
/// host each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerStatus {
    pub cutscene_locked: bool,
    /// Standing in a normal interactive state.
    pub interactive: bool,
    pub blocking_substate: bool,
    pub event_locked: bool,
    pub camera_locked: bool,
}

impl PlayerStatus {
    /// A fully idle character, safe to hand an item to.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            cutscene_locked: false,
            interactive: true,
            blocking_substate: false,
            event_locked: false,
            camera_locked: false,
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.interactive
            && !self.cutscene_locked
            && !self.blocking_substate
            && !self.event_locked
            && !self.camera_locked
    }
}

/// Debounce counter over the idle predicate. A single-frame flicker in the
/// underlying flags resets the streak, so delivery never lands on a
/// mid-transition frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessGate {
    satisfied_frames: u8,
}

impl ReadinessGate {
    /// Advance one frame. Returns true for exactly the frame on which the
    /// streak reaches the threshold; the counter resets immediately after
    /// firing.
    pub fn tick(&mut self, status: &PlayerStatus) -> bool {
        if status.is_idle() {
            self.satisfied_frames = self.satisfied_frames.saturating_add(1);
        } else {
            self.satisfied_frames = 0;
        }
        if self.satisfied_frames >= REQUIRED_IDLE_FRAMES {
            self.satisfied_frames = 0;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn satisfied_frames(&self) -> u8 {
        self.satisfied_frames
    }
}
