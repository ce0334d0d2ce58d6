//! Structured event records the engine emits for host-side logging and
//! telemetry. The host drains them once per tick.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PendingQueued,
    PendingDropped,
    PendingDelivered,
    OverrideActivated,
    ItemStaged,
    IceTrapRerouted,
    BroadcastResolved,
    OutgoingPublished,
    DropClaimed,
    DropDespawned,
    TokenResolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineEvent {
    /// Frame counter value at emission time.
    pub frame: u64,
    pub kind: EventKind,
    pub payload: Value,
}
