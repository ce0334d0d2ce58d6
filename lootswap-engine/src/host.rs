//! Trait seams to the external game. Platform-specific implementations
//! should provide these; fixture implementations live in the tests and the
//! QA harness.

use crate::active::ItemRow;
use crate::key::{ItemId, OverrideKey, PlayerId};

/// An item announced by another participant, read from the session link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingItem {
    pub player: PlayerId,
    pub item: ItemId,
}

/// Read-only item knowledge owned by the base game.
pub trait ItemCatalog {
    /// Metadata for a concrete item id; `None` for unknown ids (callers
    /// substitute the empty row).
    fn item_row(&self, item: ItemId) -> Option<ItemRow>;

    /// Map a progressive item to the concrete tier the current inventory
    /// warrants.
    fn resolve_upgrades(&self, item: ItemId) -> ItemId;
}

/// Mutable pathways into the running game: the vanilla grant machinery, the
/// ice-trap side channel, the session link, per-save bit storage, and
/// presentation.
pub trait GameHost {
    // Vanilla grant pathway.

    /// Stage a base item id into the character's incoming-item field; the
    /// game animates the grant and later confirms through
    /// [`EngineState::confirm_receipt`](crate::EngineState::confirm_receipt).
    fn stage_incoming_item(&mut self, base_item: i8);

    /// Grant an item immediately by its action id, no animation staging.
    fn give_item(&mut self, action_id: u16);

    /// Run the cutscene effect associated with an item's metadata.
    fn invoke_effect(&mut self, row: &ItemRow);

    // Ice-trap side channel.

    fn push_pending_ice_trap(&mut self);
    fn ice_trap_pending(&self) -> bool;
    fn give_ice_trap(&mut self);

    // Session link.

    /// The externally-set incoming item announcement, if any.
    fn incoming_item(&self) -> Option<IncomingItem>;

    /// Consume the current incoming announcement and advance the session's
    /// received-item accounting.
    fn acknowledge_incoming(&mut self);

    /// Publish an outgoing item. At most one transmission is in flight; a
    /// new publish overwrites the previous one, so this must only be called
    /// once the transport has consumed the last.
    fn publish_outgoing(&mut self, key: OverrideKey, item: ItemId, player: PlayerId);

    // Per-save bit storage.

    fn collectible_flag(&self, scene: u8, slot: u8) -> bool;
    fn set_collectible_flag(&mut self, scene: u8, slot: u8);

    /// Correct the save flag for the one chest whose reward is granted
    /// outside its own scene.
    fn mark_chest_opened(&mut self);

    // Presentation.

    fn message_box_open(&self) -> bool;
    fn show_textbox(&mut self, text_id: u16);
    fn play_item_fanfare(&mut self);
    fn freeze_player(&mut self, frames: u8);
}
