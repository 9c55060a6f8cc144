//! Map storage collaborator
//!
//! The editor never touches files. It reads and writes difficulty slots and
//! metadata through [`MapStore`]; whatever persists the map implements it.
//! [`MemoryMapStore`] keeps everything in memory.

use std::collections::HashMap;

use bf_core::{BfError, BfResult, Bookmark, BpmChange, Note};
use serde::{Deserialize, Serialize};

/// Maximum number of difficulty slots in a map
pub const MAX_DIFFICULTIES: usize = 3;

/// Per-difficulty metadata key holding the sort rank
pub const DIFFICULTY_RANK_KEY: &str = "_difficultyRank";

// ═══════════════════════════════════════════════════════════════════════════════
// METADATA TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl MapValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MapValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MapValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MapValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for MapValue {
    fn from(value: f64) -> Self {
        MapValue::Number(value)
    }
}

impl From<&str> for MapValue {
    fn from(value: &str) -> Self {
        MapValue::Text(value.to_string())
    }
}

impl From<String> for MapValue {
    fn from(value: String) -> Self {
        MapValue::Text(value)
    }
}

impl From<bool> for MapValue {
    fn from(value: bool) -> Self {
        MapValue::Bool(value)
    }
}

/// Score medal tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Medal {
    Bronze = 0,
    Silver = 1,
    Gold = 2,
}

impl Medal {
    pub const ALL: [Medal; 3] = [Medal::Bronze, Medal::Silver, Medal::Gold];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Which difficulty a metadata request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyRef {
    /// Whatever difficulty is active
    Current,
    /// A specific slot
    Index(usize),
}

/// Where a metadata key lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataScope {
    /// Map-wide value
    Global,
    /// Per-difficulty value (`custom` selects the custom-data section)
    Difficulty { target: DifficultyRef, custom: bool },
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Persistence backend for a map and its difficulties.
///
/// Slot indices are always `< num_difficulties()`; the editor checks before
/// calling. Implementations that persist the slot table on delete/swap must
/// do so themselves.
pub trait MapStore {
    fn num_difficulties(&self) -> usize;

    fn notes(&self, index: usize) -> Vec<Note>;
    fn bpm_changes(&self, index: usize) -> Vec<BpmChange>;
    fn bookmarks(&self, index: usize) -> Vec<Bookmark>;

    fn set_notes(&mut self, index: usize, notes: &[Note]);
    fn set_bpm_changes(&mut self, index: usize, changes: &[BpmChange]);
    fn set_bookmarks(&mut self, index: usize, bookmarks: &[Bookmark]);

    /// Append an empty difficulty slot
    fn add_difficulty_slot(&mut self);
    /// Remove a slot, shifting later slots down
    fn delete_difficulty_slot(&mut self, index: usize);
    fn swap_difficulty_slots(&mut self, a: usize, b: usize);

    /// Sort key for `sort_difficulties`
    fn difficulty_rank(&self, index: usize) -> i64;

    fn medal_distance(&self, index: usize, medal: Medal) -> i32;
    fn set_medal_distance(&mut self, index: usize, medal: Medal, distance: i32);

    fn difficulty_value(&self, index: usize, key: &str, custom: bool) -> Option<MapValue>;
    fn set_difficulty_value(&mut self, index: usize, key: &str, value: MapValue, custom: bool);

    fn global_value(&self, key: &str) -> Option<MapValue>;
    fn set_global_value(&mut self, key: &str, value: MapValue);

    /// Write everything to the persistent store
    fn save(&mut self) -> BfResult<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// One stored difficulty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredDifficulty {
    pub notes: Vec<Note>,
    pub bpm_changes: Vec<BpmChange>,
    pub bookmarks: Vec<Bookmark>,
    pub medal_distances: [i32; 3],
    pub values: HashMap<String, MapValue>,
    pub custom_values: HashMap<String, MapValue>,
}

/// [`MapStore`] kept entirely in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryMapStore {
    pub difficulties: Vec<StoredDifficulty>,
    pub values: HashMap<String, MapValue>,
    /// Number of successful saves
    #[serde(skip)]
    pub save_count: usize,
}

impl MemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with `count` empty difficulties ranked in slot order
    pub fn with_difficulties(count: usize) -> Self {
        let mut store = Self::new();
        for i in 0..count.min(MAX_DIFFICULTIES) {
            store.add_difficulty_slot();
            store.set_difficulty_value(i, DIFFICULTY_RANK_KEY, MapValue::Number(i as f64 + 1.0), false);
        }
        store
    }

    fn slot(&self, index: usize) -> BfResult<&StoredDifficulty> {
        self.difficulties
            .get(index)
            .ok_or(BfError::InvalidDifficulty(index))
    }

    fn slot_mut(&mut self, index: usize) -> BfResult<&mut StoredDifficulty> {
        self.difficulties
            .get_mut(index)
            .ok_or(BfError::InvalidDifficulty(index))
    }

    /// Serialize the whole store
    pub fn to_json(&self) -> BfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> BfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl MapStore for MemoryMapStore {
    fn num_difficulties(&self) -> usize {
        self.difficulties.len()
    }

    fn notes(&self, index: usize) -> Vec<Note> {
        self.slot(index).map(|d| d.notes.clone()).unwrap_or_default()
    }

    fn bpm_changes(&self, index: usize) -> Vec<BpmChange> {
        self.slot(index)
            .map(|d| d.bpm_changes.clone())
            .unwrap_or_default()
    }

    fn bookmarks(&self, index: usize) -> Vec<Bookmark> {
        self.slot(index)
            .map(|d| d.bookmarks.clone())
            .unwrap_or_default()
    }

    fn set_notes(&mut self, index: usize, notes: &[Note]) {
        if let Ok(slot) = self.slot_mut(index) {
            slot.notes = notes.to_vec();
        }
    }

    fn set_bpm_changes(&mut self, index: usize, changes: &[BpmChange]) {
        if let Ok(slot) = self.slot_mut(index) {
            slot.bpm_changes = changes.to_vec();
        }
    }

    fn set_bookmarks(&mut self, index: usize, bookmarks: &[Bookmark]) {
        if let Ok(slot) = self.slot_mut(index) {
            slot.bookmarks = bookmarks.to_vec();
        }
    }

    fn add_difficulty_slot(&mut self) {
        if self.difficulties.len() < MAX_DIFFICULTIES {
            self.difficulties.push(StoredDifficulty::default());
        }
    }

    fn delete_difficulty_slot(&mut self, index: usize) {
        if index < self.difficulties.len() {
            self.difficulties.remove(index);
        }
    }

    fn swap_difficulty_slots(&mut self, a: usize, b: usize) {
        if a < self.difficulties.len() && b < self.difficulties.len() {
            self.difficulties.swap(a, b);
        }
    }

    fn difficulty_rank(&self, index: usize) -> i64 {
        self.difficulty_value(index, DIFFICULTY_RANK_KEY, false)
            .and_then(|v| v.as_number())
            .map(|n| n as i64)
            .unwrap_or(0)
    }

    fn medal_distance(&self, index: usize, medal: Medal) -> i32 {
        self.slot(index)
            .map(|d| d.medal_distances[medal.index()])
            .unwrap_or(0)
    }

    fn set_medal_distance(&mut self, index: usize, medal: Medal, distance: i32) {
        if let Ok(slot) = self.slot_mut(index) {
            slot.medal_distances[medal.index()] = distance;
        }
    }

    fn difficulty_value(&self, index: usize, key: &str, custom: bool) -> Option<MapValue> {
        let slot = self.slot(index).ok()?;
        let values = if custom { &slot.custom_values } else { &slot.values };
        values.get(key).cloned()
    }

    fn set_difficulty_value(&mut self, index: usize, key: &str, value: MapValue, custom: bool) {
        if let Ok(slot) = self.slot_mut(index) {
            let values = if custom {
                &mut slot.custom_values
            } else {
                &mut slot.values
            };
            values.insert(key.to_string(), value);
        }
    }

    fn global_value(&self, key: &str) -> Option<MapValue> {
        self.values.get(key).cloned()
    }

    fn set_global_value(&mut self, key: &str, value: MapValue) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> BfResult<()> {
        self.save_count += 1;
        Ok(())
    }
}
