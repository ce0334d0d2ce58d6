//! The read-only override table and its configuration-time validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::{ItemId, OverrideKey, PlayerId};

/// Fixed capacity of the configured table.
pub const TABLE_CAPACITY: usize = 1024;

/// Substitute item descriptor stored against a location key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideValue {
    /// The item actually granted (or transmitted) for this location.
    pub item: ItemId,
    /// Participant who should ultimately receive the item.
    pub player: PlayerId,
    /// Optional cosmetic id used only for container appearance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looks_like: Option<ItemId>,
}

/// One configured substitution: a location key and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub key: OverrideKey,
    pub value: OverrideValue,
}

/// Errors raised when override configuration violates the table invariants.
///
/// A table that fails here is a configuration-time defect; once built, the
/// engine never re-validates at runtime.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("override table holds {count} records, capacity is {TABLE_CAPACITY}")]
    Oversized { count: usize },
    #[error("record {index} is out of order ({previous:#010x} comes before {current:#010x})")]
    OutOfOrder {
        index: usize,
        previous: u32,
        current: u32,
    },
    #[error("record {index} duplicates key {key:#010x}")]
    DuplicateKey { index: usize, key: u32 },
}

/// Errors raised while loading override configuration from JSON.
#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("override config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] TableError),
}

/// Container matching the on-disk override configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableData {
    pub overrides: Vec<OverrideRecord>,
}

/// Static sorted mapping from location keys to substitute items, populated
/// once from external configuration and read-only thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    records: Vec<OverrideRecord>,
}

impl OverrideTable {
    /// Create an empty table (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from pre-parsed records, enforcing capacity and strict
    /// ascending key order.
    ///
    /// # Errors
    ///
    /// Returns a `TableError` when the records exceed the fixed capacity,
    /// are unsorted, or repeat a key.
    pub fn from_records(records: Vec<OverrideRecord>) -> Result<Self, TableError> {
        if records.len() > TABLE_CAPACITY {
            return Err(TableError::Oversized {
                count: records.len(),
            });
        }
        for (index, pair) in records.windows(2).enumerate() {
            let previous = pair[0].key.packed();
            let current = pair[1].key.packed();
            if previous == current {
                return Err(TableError::DuplicateKey {
                    index: index + 1,
                    key: current,
                });
            }
            if previous > current {
                return Err(TableError::OutOfOrder {
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }
        Ok(Self { records })
    }

    /// Load a table from the JSON configuration format.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON cannot be parsed or the parsed records
    /// violate the table invariants.
    pub fn from_json(json: &str) -> Result<Self, TableLoadError> {
        let data: TableData = serde_json::from_str(json)?;
        Ok(Self::from_records(data.overrides)?)
    }

    /// Binary search for a key. Deterministic, no side effects.
    #[must_use]
    pub fn lookup(&self, key: OverrideKey) -> Option<OverrideRecord> {
        self.records
            .binary_search_by(|record| record.key.cmp(&key))
            .ok()
            .map(|index| self.records[index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[OverrideRecord] {
        &self.records
    }
}
