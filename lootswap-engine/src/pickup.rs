//! Per-class key derivation and the synchronous direct-pickup path.

use crate::host::ItemCatalog;
use crate::key::{ItemId, OverrideKey, OverrideKind};
use crate::state::EngineState;
use crate::table::{OverrideRecord, OverrideTable};

/// Scene hosting the chest minigame; its winner prize is never overridden.
pub const CHEST_MINIGAME_SCENE: u8 = 0x10;
const MINIGAME_WINNER_PRIZE: u16 = 0x75;

/// The generic grotto scene; scrub sales are only keyed inside it.
pub const GROTTO_SCENE: u8 = 0x3E;

/// Vanilla collectible kinds eligible for overriding: green, blue and red
/// rupees, recovery heart, heart piece, small key.
const OVERRIDABLE_DROP_KINDS: [u8; 6] = [0x00, 0x01, 0x02, 0x03, 0x06, 0x11];

/// Pickup classification the host constructs from its own actor data,
/// carrying exactly the fields key derivation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupClass {
    /// Chest-type actor; `variable` is its raw parameter field.
    Chest { variable: u16 },
    /// Freestanding drop; `kind` is the vanilla collectible type byte and
    /// `flag` its per-save flag slot.
    Collectible { kind: u8, flag: u8 },
    /// Golden token actor; the scene is encoded in `variable` because
    /// tokens are tracked independently of the granting scene.
    SkulltulaToken { variable: u16 },
    /// Scrub sale; `grotto` identifies the current grotto instance.
    ScrubSale { grotto: u8 },
    /// Every other pickup, keyed by scene and item id.
    Base,
}

/// Derive the composite search key for a pickup, or `None` when the pickup
/// is explicitly excluded from overriding. Pure.
#[must_use]
pub fn search_key(pickup: &PickupClass, scene: u8, item_id: u8) -> Option<OverrideKey> {
    match *pickup {
        PickupClass::Chest { variable } => {
            if scene == CHEST_MINIGAME_SCENE && (variable >> 5) & 0x7F == MINIGAME_WINNER_PRIZE {
                return None;
            }
            Some(OverrideKey::new(
                scene,
                OverrideKind::ChestItem,
                (variable & 0x1F) as u8,
            ))
        }
        PickupClass::Collectible { kind, flag } => {
            if !OVERRIDABLE_DROP_KINDS.contains(&kind) {
                return None;
            }
            Some(OverrideKey::new(scene, OverrideKind::Collectible, flag))
        }
        PickupClass::SkulltulaToken { variable } => Some(OverrideKey::new(
            ((variable >> 8) & 0x1F) as u8,
            OverrideKind::Skulltula,
            (variable & 0xFF) as u8,
        )),
        PickupClass::ScrubSale { grotto } if scene == GROTTO_SCENE => {
            Some(OverrideKey::new(grotto, OverrideKind::GrottoScrub, item_id))
        }
        PickupClass::ScrubSale { .. } | PickupClass::Base => {
            Some(OverrideKey::new(scene, OverrideKind::BaseItem, item_id))
        }
    }
}

impl OverrideTable {
    /// Derive a key for the pickup and look it up; `None` when the pickup
    /// is excluded or the location carries no override.
    #[must_use]
    pub fn lookup_for(
        &self,
        pickup: &PickupClass,
        scene: u8,
        item_id: u8,
    ) -> Option<OverrideRecord> {
        search_key(pickup, scene, item_id).and_then(|key| self.lookup(key))
    }
}

/// Result of resolving a synchronous pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectPickup {
    /// Base item id for the vanilla pathway, sign polarity preserved.
    pub item_id: i8,
    /// For chest actors, the content id to store so a revisited chest
    /// renders what it actually holds.
    pub chest_contents: Option<u8>,
}

impl EngineState {
    /// Resolve a pickup the character is interacting with right now
    /// (chests, scrub purchases, cutscene rewards). An empty lookup is a
    /// pure passthrough, indistinguishable from the engine being absent.
    pub fn resolve_direct_pickup(
        &mut self,
        catalog: &impl ItemCatalog,
        pickup: Option<&PickupClass>,
        scene: u8,
        item_id: i8,
    ) -> DirectPickup {
        let negative = item_id < 0;
        let record = match pickup {
            Some(class) if item_id != 0 => {
                self.table.lookup_for(class, scene, item_id.unsigned_abs())
            }
            _ => None,
        };

        let Some(record) = record else {
            self.clear_active();
            return DirectPickup {
                item_id,
                chest_contents: None,
            };
        };

        let active = self.activate(record, catalog);
        let mut base = active.row.base_item_id;
        let chest_contents = if matches!(pickup, Some(PickupClass::Chest { .. })) {
            if record.value.item == ItemId::ICE_TRAP
                && record.value.player == self.config.local_player
            {
                // An ice trap must keep its own vanilla content id so the
                // chest renders (and grants) the trap, not the disguise.
                base = ItemId::ICE_TRAP.0 as u8;
            }
            Some(base)
        } else {
            None
        };

        let signed = base as i8;
        DirectPickup {
            item_id: if negative { -signed } else { signed },
            chest_contents,
        }
    }
}
