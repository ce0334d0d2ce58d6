//! The one engine-state root, owned by the host tick loop and passed by
//! reference into every operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::active::ActiveOverride;
use crate::events::{EngineEvent, EventKind};
use crate::gate::ReadinessGate;
use crate::key::PlayerId;
use crate::queue::PendingQueue;
use crate::table::OverrideTable;

/// Engine configuration supplied alongside the override table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// The local participant's identity in the shared session.
    #[serde(default)]
    pub local_player: PlayerId,
    /// When set, container textures reflect the override they hold.
    #[serde(default)]
    pub chest_textures_match_contents: bool,
}

/// All mutable engine state. Single-writer-per-tick by construction: the
/// dispatcher mutates the queue and active slot, acquiring drop actors
/// mutate the mutex bit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub config: EngineConfig,
    pub table: OverrideTable,
    pub active: Option<ActiveOverride>,
    /// Whose name UI text should display for the grant in flight.
    pub display_name_owner: PlayerId,
    pub pending: PendingQueue,
    pub gate: ReadinessGate,
    /// One-bit mutex serializing freestanding-drop sequences. Held from
    /// acquisition until the winning actor despawns.
    pub collectible_busy: bool,
    /// Frames ticked so far; stamps emitted events.
    pub frame: u64,
    pub events: Vec<EngineEvent>,
}

impl EngineState {
    #[must_use]
    pub fn new(table: OverrideTable, config: EngineConfig) -> Self {
        Self {
            config,
            table,
            ..Self::default()
        }
    }

    pub fn push_event(&mut self, kind: EventKind, payload: Value) {
        self.events.push(EngineEvent {
            frame: self.frame,
            kind,
            payload,
        });
    }

    /// Drain the events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}
