//! The single-entry cache for the override currently being granted.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::events::EventKind;
use crate::host::ItemCatalog;
use crate::key::{ItemId, PlayerId};
use crate::state::EngineState;
use crate::table::OverrideRecord;

/// Container classification an item's metadata carries; drives both chest
/// animation speed and the visual-tier classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContainerTier {
    #[default]
    Plain,
    Gilded,
    SilverKey,
    BossKey,
    SkullSmall,
    SkullBig,
}

impl ContainerTier {
    /// Small containers open with the fast animation.
    #[must_use]
    pub const fn fast_open(self) -> bool {
        matches!(self, Self::Plain | Self::SilverKey | Self::SkullSmall)
    }
}

/// Denormalized item metadata fetched from the external catalog.
///
/// The all-zero row stands in for unknown ids, so downstream code never
/// branches on a missing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemRow {
    pub action_id: u16,
    pub text_id: u16,
    pub object_id: u16,
    pub graphic_id: u8,
    pub base_item_id: u8,
    #[serde(default)]
    pub container_tier: ContainerTier,
}

/// Who the resolved override is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    /// Granted to the local participant through the vanilla pathway.
    #[default]
    Local,
    /// Destined for another participant; transmitted, never granted locally.
    Outgoing,
    /// Must reach every participant in the session.
    Broadcast,
}

/// The override currently in flight for the local grant pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveOverride {
    pub record: OverrideRecord,
    /// Concrete grantable id after upgrade resolution.
    pub resolved_item: ItemId,
    pub row: ItemRow,
    pub fast_container: bool,
    pub routing: Routing,
}

impl EngineState {
    /// Resolve a record's item through the catalog and populate the active
    /// slot, classifying its routing and recording the recipient whose name
    /// the UI should display.
    pub fn activate(
        &mut self,
        record: OverrideRecord,
        catalog: &impl ItemCatalog,
    ) -> ActiveOverride {
        let resolved_item = catalog.resolve_upgrades(record.value.item);
        let row = catalog.item_row(resolved_item).unwrap_or_default();
        let routing = self.classify_routing(resolved_item, record.value.player);
        let active = ActiveOverride {
            record,
            resolved_item,
            row,
            fast_container: row.container_tier.fast_open(),
            routing,
        };
        self.active = Some(active);
        self.display_name_owner = record.value.player;
        self.push_event(
            EventKind::OverrideActivated,
            json!({
                "key": record.key.to_string(),
                "resolved_item": resolved_item.0,
                "player": record.value.player.0,
                "routing": routing,
            }),
        );
        active
    }

    /// Routing classification shared by every grant path.
    #[must_use]
    pub fn classify_routing(&self, resolved_item: ItemId, player: PlayerId) -> Routing {
        if resolved_item == ItemId::TRIFORCE_PIECE {
            Routing::Broadcast
        } else if player != self.config.local_player {
            Routing::Outgoing
        } else {
            Routing::Local
        }
    }

    /// Reset the active slot. Idempotent.
    pub fn clear_active(&mut self) {
        self.active = None;
    }
}
