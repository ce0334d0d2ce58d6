//! Lootswap Override Engine
//!
//! Platform-agnostic core of the lootswap randomizer mod: resolves
//! configured item substitutions at every pickup site and defers delivery
//! until the controlled character can safely receive them. This crate holds
//! no platform bindings; the running game implements the host traits and
//! drives [`EngineState`] from its per-frame tick.

pub mod active;
pub mod classifier;
pub mod collectible;
pub mod dispatch;
pub mod events;
pub mod gate;
pub mod host;
pub mod key;
pub mod pickup;
pub mod queue;
pub mod state;
pub mod table;

// Re-export commonly used types
pub use active::{ActiveOverride, ContainerTier, ItemRow, Routing};
pub use classifier::{TextureSet, texture_set_for};
pub use collectible::{
    DROP_FREEZE_FRAMES, DROP_MIN_HOLD_FRAMES, DropOutcome, DropPhase, FreestandingDrop,
};
pub use events::{EngineEvent, EventKind};
pub use gate::{PlayerStatus, REQUIRED_IDLE_FRAMES, ReadinessGate};
pub use host::{GameHost, IncomingItem, ItemCatalog};
pub use key::{ItemId, OverrideKey, OverrideKind, PlayerId};
pub use pickup::{DirectPickup, PickupClass, search_key};
pub use queue::{PENDING_CAPACITY, PendingQueue, PushOutcome};
pub use state::{EngineConfig, EngineState};
pub use table::{
    OverrideRecord, OverrideTable, OverrideValue, TABLE_CAPACITY, TableData, TableError,
    TableLoadError,
};
