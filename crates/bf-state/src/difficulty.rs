//! Per-difficulty editing state

use bf_core::{Bookmark, BpmChange, BpmTimeline, Note};

use crate::history::EditHistory;
use crate::notes::{NoteCollection, Selection};

/// Everything the editor tracks for one difficulty slot
#[derive(Debug, Clone)]
pub struct DifficultyState {
    pub notes: NoteCollection,
    pub selection: Selection,
    pub bookmarks: Vec<Bookmark>,
    pub timeline: BpmTimeline,
    pub history: EditHistory<Note>,
    dirty: bool,
}

impl DifficultyState {
    pub fn new(
        notes: Vec<Note>,
        bpm_changes: Vec<BpmChange>,
        bookmarks: Vec<Bookmark>,
        history_capacity: usize,
    ) -> Self {
        Self {
            notes: NoteCollection::from_notes(notes),
            selection: Selection::new(),
            bookmarks,
            timeline: BpmTimeline::from_changes(bpm_changes),
            history: EditHistory::new(history_capacity),
            dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rescale every stored beat by `new_bpm / old_bpm`.
    ///
    /// Notes, bookmarks, BPM changes, the selection and recorded history move
    /// together so the beat mapping stays consistent.
    pub fn retime(&mut self, new_bpm: f64, old_bpm: f64) {
        let factor = new_bpm / old_bpm;
        self.mark_dirty();

        self.timeline.scale_beats(factor);
        self.notes.scale_beats(factor);
        self.selection.scale_beats(factor);
        for bookmark in &mut self.bookmarks {
            bookmark.beat *= factor;
        }
        self.history.map_items(|note| note.beat *= factor);
    }

    /// Empty every owned collection
    pub fn clear(&mut self) {
        self.mark_dirty();
        self.notes.clear();
        self.selection.clear();
        self.bookmarks.clear();
        self.timeline.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::approx_eq;

    fn sample() -> DifficultyState {
        DifficultyState::new(
            vec![Note::new(1.0, 0), Note::new(2.5, 3)],
            vec![BpmChange::new(2.0, 90.0, 4)],
            vec![Bookmark::new(3.0, "Chorus")],
            10,
        )
    }

    #[test]
    fn test_new_is_clean() {
        let state = sample();
        assert!(!state.is_dirty());
        assert_eq!(state.notes.len(), 2);
        assert_eq!(state.timeline.len(), 1);
    }

    #[test]
    fn test_retime_round_trip() {
        let mut state = sample();
        state.selection.insert(Note::new(2.5, 3));

        state.retime(150.0, 120.0);
        assert!(state.is_dirty());
        assert!(approx_eq(state.notes.as_slice()[0].beat, 1.25));
        assert!(approx_eq(state.bookmarks[0].beat, 3.75));
        assert!(approx_eq(state.timeline.changes()[0].global_beat, 2.5));
        assert!(state.selection.contains(&Note::new(2.5 * 1.25, 3)));

        state.retime(120.0, 150.0);
        assert!(approx_eq(state.notes.as_slice()[1].beat, 2.5));
        assert!(approx_eq(state.bookmarks[0].beat, 3.0));
        assert!(approx_eq(state.timeline.changes()[0].global_beat, 2.0));
    }

    #[test]
    fn test_clear() {
        let mut state = sample();
        state.clear();
        assert!(state.notes.is_empty());
        assert!(state.bookmarks.is_empty());
        assert!(state.timeline.is_empty());
        assert!(state.is_dirty());
    }
}
