//! Fixture catalog and recording host the scenarios drive the engine with.

use lootswap_engine::{
    ContainerTier, EngineConfig, EngineState, GameHost, IncomingItem, ItemCatalog, ItemId,
    ItemRow, OverrideKey, OverrideKind, OverrideRecord, OverrideTable, OverrideValue, PlayerId,
};

/// Scene ids the demo table populates.
pub const DEMO_SCENE: u8 = 0x05;
pub const DEMO_DROP_SCENE: u8 = 0x51;

/// Small static item catalog covering the ids the scenarios use.
pub struct FixtureCatalog;

impl ItemCatalog for FixtureCatalog {
    fn item_row(&self, item: ItemId) -> Option<ItemRow> {
        let (text_id, container_tier, base_item_id) = match item.0 {
            0x7C => (0x9002, ContainerTier::Gilded, 0x7C),
            0x09 => (0x0036, ContainerTier::Gilded, 0x09),
            0x35 => (0x00F1, ContainerTier::Plain, 0x35),
            0x36 => (0x00F2, ContainerTier::Plain, 0x36),
            0xCA => (0x0073, ContainerTier::BossKey, 0x61),
            _ => return None,
        };
        Some(ItemRow {
            action_id: item.0,
            text_id,
            object_id: 0x0100,
            graphic_id: 0x20,
            base_item_id,
            container_tier,
        })
    }

    fn resolve_upgrades(&self, item: ItemId) -> ItemId {
        // Single progressive chain in the fixture set.
        if item == ItemId(0x08) { ItemId(0x09) } else { item }
    }
}

/// Host double that records every pathway the engine touches, so scenarios
/// can assert on the traffic.
#[derive(Default)]
pub struct RecordingHost {
    pub staged: Option<i8>,
    pub inventory: Vec<i8>,
    pub given: Vec<u16>,
    pub effects: Vec<u16>,
    pub ice_trap_pending: bool,
    pub ice_traps_sprung: u32,
    pub incoming: Option<IncomingItem>,
    pub received_counter: u16,
    pub outgoing: Option<(OverrideKey, ItemId, PlayerId)>,
    pub save_flags: Vec<(u8, u8)>,
    pub chest_opened: bool,
    pub message_open: bool,
    pub textboxes: u32,
    pub fanfares: u32,
    pub freezes: u32,
}

impl RecordingHost {
    /// Complete the staged vanilla grant the way the game would, then fire
    /// the post-receive hook.
    pub fn complete_grant(&mut self, state: &mut EngineState) {
        if let Some(base) = self.staged.take() {
            if base == 0x7C {
                self.push_pending_ice_trap();
            } else {
                self.inventory.push(base);
            }
        }
        state.confirm_receipt(self);
    }
}

impl GameHost for RecordingHost {
    fn stage_incoming_item(&mut self, base_item: i8) {
        self.staged = Some(base_item);
    }

    fn give_item(&mut self, action_id: u16) {
        self.given.push(action_id);
    }

    fn invoke_effect(&mut self, row: &ItemRow) {
        self.effects.push(row.action_id);
    }

    fn push_pending_ice_trap(&mut self) {
        self.ice_trap_pending = true;
    }

    fn ice_trap_pending(&self) -> bool {
        self.ice_trap_pending
    }

    fn give_ice_trap(&mut self) {
        self.ice_trap_pending = false;
        self.ice_traps_sprung += 1;
    }

    fn incoming_item(&self) -> Option<IncomingItem> {
        self.incoming
    }

    fn acknowledge_incoming(&mut self) {
        self.incoming = None;
        self.received_counter += 1;
    }

    fn publish_outgoing(&mut self, key: OverrideKey, item: ItemId, player: PlayerId) {
        self.outgoing = Some((key, item, player));
    }

    fn collectible_flag(&self, scene: u8, slot: u8) -> bool {
        self.save_flags.contains(&(scene, slot))
    }

    fn set_collectible_flag(&mut self, scene: u8, slot: u8) {
        self.save_flags.push((scene, slot));
    }

    fn mark_chest_opened(&mut self) {
        self.chest_opened = true;
    }

    fn message_box_open(&self) -> bool {
        self.message_open
    }

    fn show_textbox(&mut self, _text_id: u16) {
        self.textboxes += 1;
    }

    fn play_item_fanfare(&mut self) {
        self.fanfares += 1;
    }

    fn freeze_player(&mut self, _frames: u8) {
        self.freezes += 1;
    }
}

fn record(key: OverrideKey, item: u16, player: u8) -> OverrideRecord {
    OverrideRecord {
        key,
        value: OverrideValue {
            item: ItemId(item),
            player: PlayerId(player),
            looks_like: None,
        },
    }
}

/// Demo override table the scenarios share: an ice-trap chest, an outgoing
/// chest, two freestanding drops, and a pair of delayed rewards.
#[must_use]
pub fn demo_table() -> OverrideTable {
    let records = vec![
        record(
            OverrideKey::new(DEMO_SCENE, OverrideKind::ChestItem, 0x03),
            0x7C,
            0,
        ),
        record(
            OverrideKey::new(DEMO_SCENE, OverrideKind::ChestItem, 0x04),
            0x08,
            2,
        ),
        record(
            OverrideKey::new(DEMO_DROP_SCENE, OverrideKind::Collectible, 0x05),
            0x35,
            4,
        ),
        record(
            OverrideKey::new(DEMO_DROP_SCENE, OverrideKind::Collectible, 0x06),
            0x36,
            0,
        ),
        record(OverrideKey::new(0xFF, OverrideKind::Delayed, 0x02), 0x35, 0),
        record(OverrideKey::new(0xFF, OverrideKind::Delayed, 0x03), 0x36, 0),
        record(OverrideKey::new(0xFF, OverrideKind::Delayed, 0x04), 0x35, 2),
    ];
    OverrideTable::from_records(records).expect("demo table is sorted")
}

#[must_use]
pub fn demo_engine() -> EngineState {
    EngineState::new(demo_table(), EngineConfig::default())
}
