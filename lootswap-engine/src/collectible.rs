//! Freestanding-drop overrides: the one-bit mutex, the message/animation
//! sequencer, and the skulltula-token entry point.
//!
//! Several drop actors can tick in the same frame and race for the single
//! "deliver an item" presentation channel; losing that race mangles the
//! message sequence, hence the mutex held from acquisition to despawn.

use serde_json::json;

use crate::active::Routing;
use crate::events::EventKind;
use crate::host::{GameHost, ItemCatalog};
use crate::key::ItemId;
use crate::pickup::PickupClass;
use crate::state::EngineState;
use crate::table::OverrideRecord;

/// Frames the character stays frozen per refresh while the text box is up.
pub const DROP_FREEZE_FRAMES: u8 = 10;
/// Minimum ticks a claimed drop lingers before it may despawn, so a message
/// that closes unnaturally fast cannot double-trigger the sequence.
pub const DROP_MIN_HOLD_FRAMES: u8 = 15;
/// Pinned lifetime for container-spawned drops that still carry an
/// uncollected override.
pub const DROP_LIFETIME_PINNED: u8 = 0xFF;

/// Sequencing phase of one freestanding drop actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPhase {
    #[default]
    Active,
    AwaitingMessageClose,
    Despawned,
}

/// Host-constructed per-actor state for a freestanding pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreestandingDrop {
    /// Vanilla collectible type byte.
    pub kind: u8,
    /// Per-save collectible flag slot.
    pub flag: u8,
    /// Whether the drop spawned out of a crate or pot.
    pub from_container: bool,
    pub phase: DropPhase,
    /// Remaining minimum-hold ticks while awaiting the message close.
    pub hold_frames: u8,
    /// Remaining lifetime ticks before the host expires the actor.
    pub lifetime: u8,
}

/// What a drop actor's delivery attempt produced this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The override sequence started; the actor now waits for the message
    /// box to close.
    Delivered,
    /// Another actor holds the sequence channel; try again next tick.
    Busy,
    /// No override applied; the classic item was granted instead.
    Skipped,
}

/// Immediate-grant action ids for the classic freestanding items.
fn vanilla_give_id(kind: u8) -> Option<u16> {
    match kind {
        0x00 => Some(0x84), // green rupee
        0x01 => Some(0x85), // blue rupee
        0x02 => Some(0x86), // red rupee
        0x03 => Some(0x83), // recovery heart
        _ => None,
    }
}

impl EngineState {
    fn drop_override(
        &self,
        host: &impl GameHost,
        drop: &FreestandingDrop,
        scene: u8,
    ) -> Option<OverrideRecord> {
        let pickup = PickupClass::Collectible {
            kind: drop.kind,
            flag: drop.flag,
        };
        let record = self.table.lookup_for(&pickup, scene, 0)?;
        if host.collectible_flag(scene, drop.flag) {
            return None;
        }
        Some(record)
    }

    /// Whether a drop's location still carries an uncollected override.
    #[must_use]
    pub fn drop_has_override(
        &self,
        host: &impl GameHost,
        drop: &FreestandingDrop,
        scene: u8,
    ) -> bool {
        self.drop_override(host, drop, scene).is_some()
    }

    /// Attempt delivery for a freestanding drop the character just touched.
    ///
    /// At most one drop may run the message/animation sequence per frame;
    /// contenders observe [`DropOutcome::Busy`] with no state mutated and
    /// retry on their next tick.
    pub fn collect_drop<C, H>(
        &mut self,
        catalog: &C,
        host: &mut H,
        drop: &mut FreestandingDrop,
        scene: u8,
    ) -> DropOutcome
    where
        C: ItemCatalog,
        H: GameHost,
    {
        let Some(record) = self.drop_override(host, drop, scene) else {
            if let Some(action_id) = vanilla_give_id(drop.kind) {
                host.give_item(action_id);
            }
            return DropOutcome::Skipped;
        };

        if self.collectible_busy {
            return DropOutcome::Busy;
        }
        self.collectible_busy = true;

        host.set_collectible_flag(scene, drop.flag);
        let active = self.activate(record, catalog);
        match active.routing {
            Routing::Broadcast => {
                host.publish_outgoing(record.key, active.resolved_item, record.value.player);
                host.give_item(active.row.action_id);
                host.invoke_effect(&active.row);
            }
            Routing::Outgoing => {
                host.publish_outgoing(record.key, active.resolved_item, record.value.player);
            }
            Routing::Local => {
                host.give_item(active.row.action_id);
                host.invoke_effect(&active.row);
            }
        }
        host.play_item_fanfare();
        host.show_textbox(active.row.text_id);
        host.freeze_player(DROP_FREEZE_FRAMES);
        self.push_event(
            EventKind::DropClaimed,
            json!({
                "key": record.key.to_string(),
                "resolved_item": active.resolved_item.0,
                "player": record.value.player.0,
                "routing": active.routing,
            }),
        );
        // No vanilla pathway will consume this grant; the slot clears now.
        self.clear_active();

        drop.phase = DropPhase::AwaitingMessageClose;
        drop.hold_frames = DROP_MIN_HOLD_FRAMES;
        DropOutcome::Delivered
    }

    /// Tick a drop that is waiting out its message box. Releases the mutex
    /// and despawns only once the box is closed AND the minimum hold has
    /// elapsed; the host observes [`DropPhase::Despawned`] and kills the
    /// actor.
    pub fn tick_await_message(&mut self, host: &mut impl GameHost, drop: &mut FreestandingDrop) {
        if drop.phase != DropPhase::AwaitingMessageClose {
            return;
        }
        drop.hold_frames = drop.hold_frames.saturating_sub(1);
        if host.message_box_open() {
            host.freeze_player(DROP_FREEZE_FRAMES);
            return;
        }
        if drop.hold_frames == 0 {
            self.collectible_busy = false;
            drop.phase = DropPhase::Despawned;
            self.push_event(EventKind::DropDespawned, json!({ "flag": drop.flag }));
        }
    }

    /// Per-tick lifetime upkeep: container-spawned drops whose location
    /// still carries an uncollected override are kept alive instead of
    /// expiring with the container debris.
    pub fn tick_drop_lifetime(
        &self,
        host: &impl GameHost,
        drop: &mut FreestandingDrop,
        scene: u8,
    ) {
        if self.drop_has_override(host, drop, scene) {
            if drop.from_container {
                drop.lifetime = DROP_LIFETIME_PINNED;
            }
        } else if drop.lifetime > 0 {
            drop.lifetime -= 1;
        }
    }

    /// Skulltula-token entry point. Tokens already serialize through the
    /// game's own grab sequence, so no mutex is involved.
    pub fn collect_token<C, H>(&mut self, catalog: &C, host: &mut H, variable: u16)
    where
        C: ItemCatalog,
        H: GameHost,
    {
        let record = self
            .table
            .lookup_for(&PickupClass::SkulltulaToken { variable }, 0, 0);

        match record {
            Some(record) => {
                let resolved = catalog.resolve_upgrades(record.value.item);
                let row = catalog.item_row(resolved).unwrap_or_default();
                let routing = self.classify_routing(resolved, record.value.player);
                self.display_name_owner = record.value.player;
                host.show_textbox(row.text_id);
                match routing {
                    Routing::Broadcast => {
                        host.publish_outgoing(record.key, resolved, record.value.player);
                        host.give_item(row.action_id);
                        host.invoke_effect(&row);
                    }
                    Routing::Outgoing => {
                        host.publish_outgoing(record.key, resolved, record.value.player);
                    }
                    Routing::Local => {
                        host.give_item(row.action_id);
                        host.invoke_effect(&row);
                    }
                }
                self.push_event(
                    EventKind::TokenResolved,
                    json!({
                        "key": record.key.to_string(),
                        "resolved_item": resolved.0,
                        "player": record.value.player.0,
                    }),
                );
            }
            None => {
                let resolved = catalog.resolve_upgrades(ItemId::SKULLTULA_TOKEN);
                let row = catalog.item_row(resolved).unwrap_or_default();
                self.display_name_owner = self.config.local_player;
                host.show_textbox(row.text_id);
                host.give_item(row.action_id);
                host.invoke_effect(&row);
            }
        }
    }
}
