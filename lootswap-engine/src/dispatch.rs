//! Per-frame delivery dispatcher and the post-receive hook.

use serde_json::json;

use crate::active::Routing;
use crate::events::EventKind;
use crate::gate::PlayerStatus;
use crate::host::{GameHost, ItemCatalog};
use crate::key::{ItemId, OverrideKey, OverrideKind};
use crate::queue::PushOutcome;
use crate::state::EngineState;
use crate::table::{OverrideRecord, OverrideValue};

/// The one location whose reward is granted outside its own scene, leaving
/// the chest-opened save flag behind; the hook corrects it.
const FIRE_ARROW_LOCATION: OverrideKey = OverrideKey {
    scene: 0x57,
    kind: OverrideKind::BaseItem,
    flag: 0x58,
};

impl EngineState {
    /// Advance the delivery engine by one frame. Runs unconditionally once
    /// per host tick: session intake always happens, delivery only on the
    /// frames the readiness gate fires.
    pub fn run_frame<C, H>(&mut self, catalog: &C, host: &mut H, status: &PlayerStatus)
    where
        C: ItemCatalog,
        H: GameHost,
    {
        self.frame += 1;
        self.intake_session_item(host);
        if self.gate.tick(status) {
            if self.reroute_front_ice_trap(host) {
                // Rerouted this frame; its delivery window is a later fire.
            } else if host.ice_trap_pending() {
                host.give_ice_trap();
            } else {
                self.try_pending_item(catalog, host);
            }
        }
    }

    /// Queue a record for deferred delivery, recording what happened to it.
    pub fn push_pending(&mut self, record: OverrideRecord) {
        match self.pending.push(record) {
            PushOutcome::Queued => self.push_event(
                EventKind::PendingQueued,
                json!({
                    "key": record.key.to_string(),
                    "item": record.value.item.0,
                    "player": record.value.player.0,
                    "depth": self.pending.len(),
                }),
            ),
            PushOutcome::AlreadyQueued => {}
            PushOutcome::Dropped => self.push_event(
                EventKind::PendingDropped,
                json!({
                    "key": record.key.to_string(),
                    "item": record.value.item.0,
                }),
            ),
        }
    }

    /// Look up a deliberately delayed reward by its application-chosen flag
    /// and queue it if the table carries one.
    pub fn push_delayed(&mut self, flag: u8) {
        let key = OverrideKey::new(0xFF, OverrideKind::Delayed, flag);
        if let Some(record) = self.table.lookup(key) {
            self.push_pending(record);
        }
    }

    fn intake_session_item(&mut self, host: &mut impl GameHost) {
        let Some(incoming) = host.incoming_item() else {
            return;
        };
        self.push_pending(OverrideRecord {
            key: OverrideKey::SESSION_SYNC,
            value: OverrideValue {
                item: incoming.item,
                player: incoming.player,
                looks_like: None,
            },
        });
    }

    /// A local ice trap at the queue front never enters the vanilla grant
    /// pathway; it uses its own animation channel. Returns whether a reroute
    /// happened this frame.
    fn reroute_front_ice_trap(&mut self, host: &mut impl GameHost) -> bool {
        let Some(front) = self.pending.peek_front().copied() else {
            return false;
        };
        if front.value.item != ItemId::ICE_TRAP
            || front.value.player != self.config.local_player
        {
            return false;
        }
        host.push_pending_ice_trap();
        self.pending.pop_front();
        self.push_event(
            EventKind::IceTrapRerouted,
            json!({ "key": front.key.to_string() }),
        );
        self.after_key_received(front.key, host);
        true
    }

    fn try_pending_item(&mut self, catalog: &impl ItemCatalog, host: &mut impl GameHost) {
        let Some(front) = self.pending.peek_front().copied() else {
            return;
        };

        let resolved = catalog.resolve_upgrades(front.value.item);
        if resolved == ItemId::TRIFORCE_PIECE && front.value.player != self.config.local_player {
            // The reward lands on every participant instantly; no character
            // animation, so the queue entry completes on the spot.
            let row = catalog.item_row(resolved).unwrap_or_default();
            host.invoke_effect(&row);
            self.pending.pop_front();
            self.push_event(
                EventKind::BroadcastResolved,
                json!({ "key": front.key.to_string(), "player": front.value.player.0 }),
            );
            self.after_key_received(front.key, host);
            self.clear_active();
            return;
        }

        let active = self.activate(front, catalog);
        host.stage_incoming_item(active.row.base_item_id as i8);
        self.push_event(
            EventKind::ItemStaged,
            json!({
                "key": front.key.to_string(),
                "resolved_item": active.resolved_item.0,
                "base_item": active.row.base_item_id,
            }),
        );
        // The entry stays at the front until the grant pathway confirms
        // through confirm_receipt.
    }

    /// Post-receive hook: the host calls this once the vanilla grant
    /// pathway confirms the staged item was fully consumed. No-op while the
    /// active slot is empty.
    pub fn confirm_receipt(&mut self, host: &mut impl GameHost) {
        let Some(active) = self.active else {
            return;
        };

        if active.routing != Routing::Local {
            host.publish_outgoing(
                active.record.key,
                active.resolved_item,
                active.record.value.player,
            );
            self.push_event(
                EventKind::OutgoingPublished,
                json!({
                    "key": active.record.key.to_string(),
                    "item": active.resolved_item.0,
                    "player": active.record.value.player.0,
                }),
            );
        }

        if self
            .pending
            .peek_front()
            .is_some_and(|front| front.key == active.record.key)
        {
            self.pending.pop_front();
            self.push_event(
                EventKind::PendingDelivered,
                json!({ "key": active.record.key.to_string() }),
            );
        }

        self.after_key_received(active.record.key, host);
        self.clear_active();
    }

    /// Key-specific side effects shared by every completion path.
    fn after_key_received(&mut self, key: OverrideKey, host: &mut impl GameHost) {
        if key == OverrideKey::SESSION_SYNC {
            host.acknowledge_incoming();
            return;
        }
        if key == FIRE_ARROW_LOCATION {
            host.mark_chest_opened();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::{ContainerTier, ItemRow, Routing};
    use crate::host::IncomingItem;
    use crate::key::PlayerId;
    use crate::table::OverrideTable;

    #[derive(Default)]
    struct ScriptCatalog;

    impl ItemCatalog for ScriptCatalog {
        fn item_row(&self, item: ItemId) -> Option<ItemRow> {
            Some(ItemRow {
                action_id: item.0 + 0x100,
                text_id: 0x40,
                object_id: 0x2,
                graphic_id: 0x2,
                base_item_id: (item.0 & 0xFF) as u8,
                container_tier: ContainerTier::Plain,
            })
        }

        fn resolve_upgrades(&self, item: ItemId) -> ItemId {
            item
        }
    }

    #[derive(Default)]
    struct ScriptHost {
        incoming: Option<IncomingItem>,
        acknowledged: u32,
        staged: Vec<i8>,
        given: Vec<u16>,
        effects: Vec<u16>,
        ice_trap_pushes: u32,
        ice_traps_given: u32,
        ice_trap_pending: bool,
        outgoing: Option<(OverrideKey, ItemId, PlayerId)>,
        chest_opened: bool,
    }

    impl GameHost for ScriptHost {
        fn stage_incoming_item(&mut self, base_item: i8) {
            self.staged.push(base_item);
        }

        fn give_item(&mut self, action_id: u16) {
            self.given.push(action_id);
        }

        fn invoke_effect(&mut self, row: &ItemRow) {
            self.effects.push(row.action_id);
        }

        fn push_pending_ice_trap(&mut self) {
            self.ice_trap_pushes += 1;
            self.ice_trap_pending = true;
        }

        fn ice_trap_pending(&self) -> bool {
            self.ice_trap_pending
        }

        fn give_ice_trap(&mut self) {
            self.ice_traps_given += 1;
            self.ice_trap_pending = false;
        }

        fn incoming_item(&self) -> Option<IncomingItem> {
            self.incoming
        }

        fn acknowledge_incoming(&mut self) {
            self.incoming = None;
            self.acknowledged += 1;
        }

        fn publish_outgoing(&mut self, key: OverrideKey, item: ItemId, player: PlayerId) {
            self.outgoing = Some((key, item, player));
        }

        fn collectible_flag(&self, _scene: u8, _slot: u8) -> bool {
            false
        }

        fn set_collectible_flag(&mut self, _scene: u8, _slot: u8) {}

        fn mark_chest_opened(&mut self) {
            self.chest_opened = true;
        }

        fn message_box_open(&self) -> bool {
            false
        }

        fn show_textbox(&mut self, _text_id: u16) {}

        fn play_item_fanfare(&mut self) {}

        fn freeze_player(&mut self, _frames: u8) {}
    }

    fn delayed_record(flag: u8, item: u16, player: u8) -> OverrideRecord {
        OverrideRecord {
            key: OverrideKey::new(0xFF, OverrideKind::Delayed, flag),
            value: OverrideValue {
                item: ItemId(item),
                player: PlayerId(player),
                looks_like: None,
            },
        }
    }

    fn run_idle_frames(
        state: &mut EngineState,
        catalog: &ScriptCatalog,
        host: &mut ScriptHost,
        frames: usize,
    ) {
        for _ in 0..frames {
            state.run_frame(catalog, host, &PlayerStatus::idle());
        }
    }

    #[test]
    fn session_intake_queues_once_per_announcement() {
        let mut state = EngineState::default();
        let mut host = ScriptHost {
            incoming: Some(IncomingItem {
                player: PlayerId(2),
                item: ItemId(0x35),
            }),
            ..ScriptHost::default()
        };
        let blocked = PlayerStatus::default();

        state.run_frame(&ScriptCatalog, &mut host, &blocked);
        state.run_frame(&ScriptCatalog, &mut host, &blocked);

        assert_eq!(state.pending.len(), 1);
        assert_eq!(
            state.pending.peek_front().unwrap().key,
            OverrideKey::SESSION_SYNC
        );
    }

    #[test]
    fn delivery_waits_for_the_debounced_gate() {
        let mut state = EngineState::default();
        state.push_pending(delayed_record(0x01, 0x35, 0));
        let mut host = ScriptHost::default();

        state.run_frame(&ScriptCatalog, &mut host, &PlayerStatus::idle());
        assert!(host.staged.is_empty());
        state.run_frame(&ScriptCatalog, &mut host, &PlayerStatus::idle());
        assert_eq!(host.staged, vec![0x35]);
        // Still at the front until the grant pathway confirms.
        assert_eq!(state.pending.len(), 1);
        assert!(state.active.is_some());
    }

    #[test]
    fn receipt_confirmation_pops_and_clears() {
        let mut state = EngineState::default();
        state.push_pending(delayed_record(0x01, 0x35, 0));
        let mut host = ScriptHost::default();
        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);

        state.confirm_receipt(&mut host);

        assert!(state.pending.is_empty());
        assert!(state.active.is_none());
        assert!(host.outgoing.is_none());
    }

    #[test]
    fn confirm_receipt_without_active_override_is_a_no_op() {
        let mut state = EngineState::default();
        let mut host = ScriptHost::default();
        state.confirm_receipt(&mut host);
        assert!(host.outgoing.is_none());
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn local_ice_trap_reroutes_through_the_side_channel() {
        let mut state = EngineState::default();
        state.push_pending(delayed_record(0x01, ItemId::ICE_TRAP.0, 0));
        let mut host = ScriptHost::default();

        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);

        assert_eq!(host.ice_trap_pushes, 1);
        assert!(host.staged.is_empty());
        assert!(state.pending.is_empty());
        // The trap's own delivery window arrives on a later gate fire.
        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);
        assert_eq!(host.ice_traps_given, 1);
    }

    #[test]
    fn ice_trap_for_another_player_is_staged_normally() {
        let mut state = EngineState::default();
        state.push_pending(delayed_record(0x01, ItemId::ICE_TRAP.0, 4));
        let mut host = ScriptHost::default();

        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);

        assert_eq!(host.ice_trap_pushes, 0);
        assert_eq!(host.staged.len(), 1);
        assert_eq!(state.active.unwrap().routing, Routing::Outgoing);
    }

    #[test]
    fn broadcast_for_another_player_short_circuits() {
        let mut state = EngineState::default();
        state.push_pending(delayed_record(0x01, ItemId::TRIFORCE_PIECE.0, 4));
        let mut host = ScriptHost::default();

        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);

        assert_eq!(host.effects.len(), 1);
        assert!(host.staged.is_empty());
        assert!(state.pending.is_empty());
        assert!(state.active.is_none());
    }

    #[test]
    fn local_broadcast_item_still_animates() {
        let mut state = EngineState::default();
        state.push_pending(delayed_record(0x01, ItemId::TRIFORCE_PIECE.0, 0));
        let mut host = ScriptHost::default();

        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);

        assert!(host.effects.is_empty());
        assert_eq!(host.staged.len(), 1);
        assert_eq!(state.active.unwrap().routing, Routing::Broadcast);
    }

    #[test]
    fn outgoing_receipt_publishes_the_destination() {
        let mut state = EngineState::default();
        state.push_pending(delayed_record(0x01, 0x35, 6));
        let mut host = ScriptHost::default();
        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);

        state.confirm_receipt(&mut host);

        let (key, item, player) = host.outgoing.expect("publish expected");
        assert_eq!(key, OverrideKey::new(0xFF, OverrideKind::Delayed, 0x01));
        assert_eq!(item, ItemId(0x35));
        assert_eq!(player, PlayerId(6));
    }

    #[test]
    fn session_sync_receipt_acknowledges_the_channel() {
        let mut state = EngineState::default();
        let mut host = ScriptHost {
            incoming: Some(IncomingItem {
                player: PlayerId(2),
                item: ItemId(0x35),
            }),
            ..ScriptHost::default()
        };

        run_idle_frames(&mut state, &ScriptCatalog, &mut host, 2);
        state.confirm_receipt(&mut host);

        assert_eq!(host.acknowledged, 1);
        assert!(host.incoming.is_none());
        assert!(state.pending.is_empty());
    }

    #[test]
    fn fire_arrow_receipt_corrects_the_chest_flag() {
        let record = OverrideRecord {
            key: FIRE_ARROW_LOCATION,
            value: OverrideValue {
                item: ItemId(0x58),
                player: PlayerId(0),
                looks_like: None,
            },
        };
        let mut state = EngineState {
            table: OverrideTable::from_records(vec![record]).unwrap(),
            ..EngineState::default()
        };
        let mut host = ScriptHost::default();
        state.activate(record, &ScriptCatalog);

        state.confirm_receipt(&mut host);

        assert!(host.chest_opened);
    }

    #[test]
    fn push_delayed_queues_only_configured_flags() {
        let record = delayed_record(0x02, 0x35, 0);
        let mut state = EngineState {
            table: OverrideTable::from_records(vec![record]).unwrap(),
            ..EngineState::default()
        };
        state.push_delayed(0x02);
        state.push_delayed(0x07);
        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.pending.peek_front().unwrap().key, record.key);
    }

    #[test]
    fn duplicate_session_push_keeps_queue_length_one() {
        let mut state = EngineState::default();
        let mut host = ScriptHost {
            incoming: Some(IncomingItem {
                player: PlayerId(2),
                item: ItemId(0x35),
            }),
            ..ScriptHost::default()
        };
        let blocked = PlayerStatus::default();
        for _ in 0..5 {
            state.run_frame(&ScriptCatalog, &mut host, &blocked);
        }
        assert_eq!(state.pending.len(), 1);
    }
}
