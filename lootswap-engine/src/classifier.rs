//! Visual-tier classification for container rendering.

use serde::{Deserialize, Serialize};

use crate::active::ContainerTier;
use crate::host::ItemCatalog;
use crate::state::EngineState;
use crate::table::OverrideRecord;

/// Cosmetic texture sets a container can render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextureSet {
    #[default]
    Wooden,
    Gilded,
    Silver,
    Boss,
    Skull,
}

/// Map a container tier to its texture set. Pure; returns the default set
/// when the textures-match-contents option is off.
#[must_use]
pub const fn texture_set_for(tier: ContainerTier, textures_match_contents: bool) -> TextureSet {
    if !textures_match_contents {
        return TextureSet::Wooden;
    }
    match tier {
        ContainerTier::Plain => TextureSet::Wooden,
        ContainerTier::Gilded => TextureSet::Gilded,
        ContainerTier::SilverKey => TextureSet::Silver,
        ContainerTier::BossKey => TextureSet::Boss,
        ContainerTier::SkullSmall | ContainerTier::SkullBig => TextureSet::Skull,
    }
}

impl EngineState {
    /// Texture set for a configured override, honoring its cosmetic
    /// `looks_like` id when one is present.
    #[must_use]
    pub fn texture_set_for_record(
        &self,
        catalog: &impl ItemCatalog,
        record: &OverrideRecord,
    ) -> TextureSet {
        if !self.config.chest_textures_match_contents {
            return TextureSet::default();
        }
        let shown = record.value.looks_like.unwrap_or(record.value.item);
        let row = catalog
            .item_row(catalog.resolve_upgrades(shown))
            .unwrap_or_default();
        texture_set_for(row.container_tier, true)
    }
}
