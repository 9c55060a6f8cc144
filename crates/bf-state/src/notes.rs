//! Note Collection, Selection and Clipboard
//!
//! - Sorted, duplicate-free note storage for one difficulty
//! - Selection subset (membership only)
//! - Clipboard snapshot with anchor-relative paste

use bf_core::{Note, COLUMN_COUNT};
use serde::{Deserialize, Serialize};

/// Insert `note` keeping canonical order; false if an equal note exists
pub fn insert_sorted_unique(notes: &mut Vec<Note>, note: Note) -> bool {
    match notes.binary_search_by(|probe| probe.canonical_cmp(&note)) {
        Ok(_) => false,
        Err(idx) => {
            notes.insert(idx, note);
            true
        }
    }
}

fn remove_sorted(notes: &mut Vec<Note>, note: &Note) -> bool {
    match notes.binary_search_by(|probe| probe.canonical_cmp(note)) {
        Ok(idx) => {
            notes.remove(idx);
            true
        }
        Err(_) => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTE COLLECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// All notes of one difficulty, in canonical order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteCollection {
    notes: Vec<Note>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an arbitrary list; duplicates collapse
    pub fn from_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let mut collection = Self::new();
        for note in notes {
            collection.insert_unique(note);
        }
        collection
    }

    /// Insert unless a note shares both beat and column
    pub fn insert_unique(&mut self, note: Note) -> bool {
        insert_sorted_unique(&mut self.notes, note)
    }

    /// Remove matching notes; returns the ones that were present
    pub fn remove(&mut self, notes: &[Note]) -> Vec<Note> {
        notes
            .iter()
            .filter(|n| remove_sorted(&mut self.notes, n))
            .copied()
            .collect()
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.notes
            .binary_search_by(|probe| probe.canonical_cmp(note))
            .is_ok()
    }

    /// Multiply every beat by `factor` (order is preserved for positive factors)
    pub fn scale_beats(&mut self, factor: f64) {
        for note in &mut self.notes {
            note.beat *= factor;
        }
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Selected subset of a note collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    notes: Vec<Note>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, note: Note) -> bool {
        insert_sorted_unique(&mut self.notes, note)
    }

    pub fn remove(&mut self, note: &Note) -> bool {
        remove_sorted(&mut self.notes, note)
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.notes
            .binary_search_by(|probe| probe.canonical_cmp(note))
            .is_ok()
    }

    /// Drop members that are no longer in `collection`
    pub fn retain_existing(&mut self, collection: &NoteCollection) {
        self.notes.retain(|n| collection.contains(n));
    }

    pub fn scale_beats(&mut self, factor: f64) {
        for note in &mut self.notes {
            note.beat *= factor;
        }
    }

    /// Empty the selection, returning what was selected
    pub fn take(&mut self) -> Vec<Note> {
        std::mem::take(&mut self.notes)
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLIPBOARD
// ═══════════════════════════════════════════════════════════════════════════════

/// Copied notes, anchored on the first one for paste
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    notes: Vec<Note>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace contents with `notes` in canonical order
    pub fn copy_from(&mut self, notes: &[Note]) {
        self.notes = notes.to_vec();
        self.notes.sort_by(Note::canonical_cmp);
    }

    /// Paste candidates so the first note lands on `beat_offset`/`col_start`.
    ///
    /// Without `col_start` the columns stay as copied. Candidates outside
    /// `[0, max_beat]` or the column range are dropped.
    pub fn paste_targets(&self, beat_offset: f64, col_start: Option<u8>, max_beat: f64) -> Vec<Note> {
        let Some(anchor) = self.notes.first() else {
            return Vec::new();
        };

        let row_offset = beat_offset - anchor.beat;
        let col_offset = col_start.map_or(0, |c| c as i32 - anchor.column as i32);

        self.notes
            .iter()
            .filter_map(|note| {
                let beat = note.beat + row_offset;
                let column = note.column as i32 + col_offset;
                if beat < 0.0 || beat > max_beat {
                    return None;
                }
                if column < 0 || column >= COLUMN_COUNT as i32 {
                    return None;
                }
                Some(Note::new(beat, column as u8))
            })
            .collect()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}
