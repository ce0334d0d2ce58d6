//! Composite location keys and the id newtypes shared across the engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Item identifier in the base game's id space, extended with sentinel ids
/// for special substitutes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ItemId(pub u16);

impl ItemId {
    /// Prank item delivered through its own animation channel.
    pub const ICE_TRAP: Self = Self(0x7C);
    /// Reward that must reach every participant in the session.
    pub const TRIFORCE_PIECE: Self = Self(0xCA);
    /// The token granted when a skulltula pickup carries no override.
    pub const SKULLTULA_TOKEN: Self = Self(0x5B);
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Participant identifier within a shared session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Pickup class a location key addresses.
///
/// Discriminants start at 1 so that no well-formed key ever packs to zero;
/// the all-zero packed form stays reserved as the "no override" sentinel of
/// the binary table layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OverrideKind {
    ChestItem = 1,
    Collectible = 2,
    Skulltula = 3,
    GrottoScrub = 4,
    BaseItem = 5,
    Delayed = 6,
}

impl OverrideKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChestItem => "chest_item",
            Self::Collectible => "collectible",
            Self::Skulltula => "skulltula",
            Self::GrottoScrub => "grotto_scrub",
            Self::BaseItem => "base_item",
            Self::Delayed => "delayed",
        }
    }
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key addressing one overridable location: scene, pickup class,
/// and a class-specific sub-identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverrideKey {
    pub scene: u8,
    pub kind: OverrideKind,
    pub flag: u8,
}

impl OverrideKey {
    /// Reserved key under which session-synchronized incoming items travel.
    pub const SESSION_SYNC: Self = Self {
        scene: 0xFF,
        kind: OverrideKind::Delayed,
        flag: 0xFF,
    };

    #[must_use]
    pub const fn new(scene: u8, kind: OverrideKind, flag: u8) -> Self {
        Self { scene, kind, flag }
    }

    /// Packed form; the table's sort order and binary search compare this.
    #[must_use]
    pub const fn packed(self) -> u32 {
        ((self.scene as u32) << 16) | ((self.kind as u32) << 8) | self.flag as u32
    }
}

impl Ord for OverrideKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.packed().cmp(&other.packed())
    }
}

impl PartialOrd for OverrideKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scene {:#04x} flag {:#04x}",
            self.kind, self.scene, self.flag
        )
    }
}
