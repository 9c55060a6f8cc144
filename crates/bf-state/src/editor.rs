//! Map Editor
//!
//! The editing surface for one map:
//! - Difficulty slots (create, delete, sort, switch)
//! - Note edits with undo/redo (add, remove, move, quantize, mirror, randomize)
//! - Selection and clipboard
//! - BPM changes, bookmarks and retiming
//! - Map/difficulty metadata passthrough
//!
//! Every note mutation funnels through `add_notes`/`remove_notes`, which keep
//! the dirty flag, renderer and history in step. With no active difficulty all
//! edit operations are no-ops.

use bf_core::{
    BfResult, Bookmark, BookmarkId, BpmChange, BpmTimeline, MapTiming, MoveDirection, Note,
    COLUMN_COUNT,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::difficulty::DifficultyState;
use crate::history::{Edit, EditKind, EditTransaction};
use crate::notes::Clipboard;
use crate::preferences::EditorPreferences;
use crate::renderer::GridRenderer;
use crate::storage::{DifficultyRef, MapStore, MapValue, Medal, MetadataScope, MAX_DIFFICULTIES};

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVE DIFFICULTY
// ═══════════════════════════════════════════════════════════════════════════════

/// Which difficulty slot is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveDifficulty {
    #[default]
    None,
    Index(usize),
}

impl ActiveDifficulty {
    pub fn index(self) -> Option<usize> {
        match self {
            ActiveDifficulty::None => None,
            ActiveDifficulty::Index(i) => Some(i),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAP EDITOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Editor facade owning every difficulty of one map
pub struct MapEditor<S: MapStore, R: GridRenderer> {
    store: S,
    renderer: R,
    timing: MapTiming,
    difficulties: [Option<DifficultyState>; MAX_DIFFICULTIES],
    active: ActiveDifficulty,
    clipboard: Clipboard,
    /// Map-level metadata changed since the last save
    needs_save: bool,
    history_capacity: usize,
    rng: ChaCha8Rng,
}

impl<S: MapStore, R: GridRenderer> MapEditor<S, R> {
    /// Open a map: every stored difficulty is loaded, none is active
    pub fn new(
        store: S,
        renderer: R,
        global_bpm: f64,
        song_duration: f64,
        prefs: &EditorPreferences,
    ) -> Self {
        let seed = prefs.random_seed.unwrap_or_else(rand::random);
        let mut editor = Self {
            store,
            renderer,
            timing: MapTiming::new(global_bpm, song_duration, prefs.default_grid_division),
            difficulties: std::array::from_fn(|_| None),
            active: ActiveDifficulty::None,
            clipboard: Clipboard::new(),
            needs_save: false,
            history_capacity: prefs.history_capacity,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };

        let count = editor.store.num_difficulties().min(MAX_DIFFICULTIES);
        for index in 0..count {
            editor.difficulties[index] = Some(editor.load_slot(index));
        }
        log::info!("Opened map with {} difficulties", count);
        editor
    }

    /// Reseed the column randomizer
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    fn load_slot(&self, index: usize) -> DifficultyState {
        DifficultyState::new(
            self.store.notes(index),
            self.store.bpm_changes(index),
            self.store.bookmarks(index),
            self.history_capacity,
        )
    }

    fn active_state(&self) -> Option<&DifficultyState> {
        let index = self.active.index()?;
        self.difficulties.get(index)?.as_ref()
    }

    fn active_state_mut(&mut self) -> Option<&mut DifficultyState> {
        let index = self.active.index()?;
        self.difficulties.get_mut(index)?.as_mut()
    }

    fn active_parts(&mut self) -> Option<(&mut DifficultyState, &mut R)> {
        let index = self.active.index()?;
        let state = self.difficulties.get_mut(index)?.as_mut()?;
        Some((state, &mut self.renderer))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn num_difficulties(&self) -> usize {
        self.store.num_difficulties()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.index()
    }

    pub fn difficulty(&self, index: usize) -> Option<&DifficultyState> {
        self.difficulties.get(index)?.as_ref()
    }

    pub fn active_difficulty(&self) -> Option<&DifficultyState> {
        self.active_state()
    }

    /// Notes of the active difficulty (empty when none is active)
    pub fn notes(&self) -> &[Note] {
        self.active_state()
            .map(|s| s.notes.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_notes(&self) -> &[Note] {
        self.active_state()
            .map(|s| s.selection.as_slice())
            .unwrap_or(&[])
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        self.active_state()
            .map(|s| s.bookmarks.as_slice())
            .unwrap_or(&[])
    }

    pub fn bpm_changes(&self) -> &[BpmChange] {
        self.active_state()
            .map(|s| s.timeline.changes())
            .unwrap_or(&[])
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn timing(&self) -> &MapTiming {
        &self.timing
    }

    pub fn can_undo(&self) -> bool {
        self.active_state().is_some_and(|s| s.history.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.active_state().is_some_and(|s| s.history.can_redo())
    }

    /// Any unsaved change in the map or any difficulty
    pub fn save_is_needed(&self) -> bool {
        self.needs_save || self.difficulties.iter().flatten().any(|d| d.is_dirty())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Timing
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn global_bpm(&self) -> f64 {
        self.timing.global_bpm
    }

    pub fn set_global_bpm(&mut self, bpm: f64) {
        if !(bpm.is_finite() && bpm > 0.0) {
            log::warn!("Ignoring invalid global BPM {}", bpm);
            return;
        }
        self.timing.global_bpm = bpm;
    }

    pub fn song_duration(&self) -> f64 {
        self.timing.song_duration
    }

    pub fn set_song_duration(&mut self, seconds: f64) {
        self.timing.song_duration = seconds.max(0.0);
    }

    /// Last beat a pasted note may land on
    pub fn max_beat(&self) -> f64 {
        self.timing.max_beat()
    }

    pub fn grid_length(&self, bpm: f64, division: u32) -> f64 {
        self.timing.grid_length(bpm, division)
    }

    /// BPM change governing `beat` in the active difficulty
    pub fn last_beat_change(&self, beat: f64) -> BpmChange {
        match self.active_state() {
            Some(state) => state.timeline.active_change_at(beat, &self.timing),
            None => BpmTimeline::new().active_change_at(beat, &self.timing),
        }
    }

    /// Rescale the active difficulty after a global BPM change
    pub fn retime_notes_and_markers(&mut self, new_bpm: f64, old_bpm: f64) {
        if new_bpm <= 0.0 || old_bpm <= 0.0 {
            log::warn!("Ignoring retime {} -> {}", old_bpm, new_bpm);
            return;
        }
        let Some((state, renderer)) = self.active_parts() else {
            return;
        };
        state.retime(new_bpm, old_bpm);
        renderer.redraw_timeline();
        log::debug!("Retimed difficulty from {} to {} BPM", old_bpm, new_bpm);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────────

    fn flush_difficulty(&mut self, index: usize) {
        if index >= self.store.num_difficulties() {
            return;
        }
        if let Some(state) = self.difficulties[index].as_ref() {
            self.store.set_notes(index, state.notes.as_slice());
            self.store.set_bookmarks(index, &state.bookmarks);
            self.store.set_bpm_changes(index, state.timeline.changes());
        }
    }

    /// Write every difficulty back and persist the map
    pub fn save_map(&mut self) -> BfResult<()> {
        let count = self.store.num_difficulties().min(MAX_DIFFICULTIES);
        for index in 0..count {
            self.flush_difficulty(index);
        }
        self.store.save()?;

        self.needs_save = false;
        for state in self.difficulties.iter_mut().flatten() {
            state.mark_saved();
        }
        log::info!("Saved map ({} difficulties)", count);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Difficulty Management
    // ─────────────────────────────────────────────────────────────────────────────

    /// Switch the active difficulty, flushing the current one to the store
    pub fn select_difficulty(&mut self, index: usize) {
        if let Some(current) = self.active.index() {
            self.flush_difficulty(current);
        }

        let exists = index < self.store.num_difficulties() && self.difficulties[index].is_some();
        self.active = if exists {
            ActiveDifficulty::Index(index)
        } else {
            log::warn!("Difficulty {} does not exist", index);
            ActiveDifficulty::None
        };
        log::debug!("Active difficulty: {:?}", self.active);
    }

    /// Leave no difficulty active
    pub fn deselect_difficulty(&mut self) {
        if let Some(current) = self.active.index() {
            self.flush_difficulty(current);
        }
        self.active = ActiveDifficulty::None;
    }

    /// Append a difficulty slot, optionally copying the active markers
    pub fn create_difficulty(&mut self, copy_markers: bool) {
        let count = self.store.num_difficulties();
        if count >= MAX_DIFFICULTIES {
            log::warn!("Map already has {} difficulties", count);
            return;
        }

        self.store.add_difficulty_slot();
        if self.store.num_difficulties() != count + 1 {
            log::warn!("Store refused a new difficulty slot");
            return;
        }
        self.needs_save = true;
        let new_index = count;

        let markers = if copy_markers {
            self.active_state().map(|s| {
                let bookmarks: Vec<Bookmark> = s.bookmarks.iter().map(Bookmark::duplicate).collect();
                (bookmarks, s.timeline.changes().to_vec())
            })
        } else {
            None
        };
        if let Some((bookmarks, changes)) = &markers {
            self.store.set_bookmarks(new_index, bookmarks);
            self.store.set_bpm_changes(new_index, changes);
        }

        let mut state = self.load_slot(new_index);
        if markers.is_some() {
            state.mark_dirty();
        }
        self.difficulties[new_index] = Some(state);
        self.renderer.difficulty_slots_changed();
        log::info!("Created difficulty {} (markers copied: {})", new_index, markers.is_some());
    }

    /// Delete the active difficulty
    pub fn delete_active_difficulty(&mut self) -> bool {
        match self.active.index() {
            Some(index) => self.delete_difficulty(index),
            None => false,
        }
    }

    /// Delete a slot; later slots shift down.
    ///
    /// Returns whether the active index still points at an existing
    /// difficulty. When it does not, no difficulty is active afterwards.
    pub fn delete_difficulty(&mut self, index: usize) -> bool {
        let count = self.store.num_difficulties();
        if index >= count {
            log::warn!("Cannot delete missing difficulty {}", index);
            return self.active_state().is_some();
        }

        self.difficulties[index] = None;
        self.difficulties[index..].rotate_left(1);
        self.store.delete_difficulty_slot(index);
        self.needs_save = true;
        self.renderer.difficulty_slots_changed();
        log::info!("Deleted difficulty {}", index);

        let remaining = self.store.num_difficulties();
        let valid = matches!(self.active, ActiveDifficulty::Index(i) if i < remaining);
        if !valid {
            self.active = ActiveDifficulty::None;
        }
        valid
    }

    /// Order slots by difficulty rank; the active index follows its content
    pub fn sort_difficulties(&mut self) {
        let count = self.store.num_difficulties().min(MAX_DIFFICULTIES);
        if count < 2 {
            return;
        }

        loop {
            let mut swapped = false;
            for i in 0..count - 1 {
                if self.store.difficulty_rank(i) > self.store.difficulty_rank(i + 1) {
                    self.swap_difficulties(i, i + 1);
                    self.active = match self.active {
                        ActiveDifficulty::Index(a) if a == i => ActiveDifficulty::Index(i + 1),
                        ActiveDifficulty::Index(a) if a == i + 1 => ActiveDifficulty::Index(i),
                        other => other,
                    };
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }

        if let Some(index) = self.active.index() {
            self.select_difficulty(index);
        }
    }

    fn swap_difficulties(&mut self, a: usize, b: usize) {
        self.difficulties.swap(a, b);
        self.store.swap_difficulty_slots(a, b);
        self.renderer.difficulty_slots_changed();
        log::debug!("Swapped difficulties {} and {}", a, b);
    }

    /// Remove all notes and markers from the active difficulty
    pub fn clear_selected_difficulty(&mut self) {
        let Some((state, renderer)) = self.active_parts() else {
            return;
        };
        renderer.unhighlight_notes(state.selection.as_slice());
        renderer.undraw_notes(state.notes.as_slice());
        state.clear();
        renderer.redraw_timeline();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Markers
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn add_bpm_change(&mut self, change: BpmChange, redraw: bool) {
        if !change.is_valid() {
            log::warn!("Ignoring invalid BPM change {:?}", change);
            return;
        }
        let Some((state, renderer)) = self.active_parts() else {
            return;
        };
        state.mark_dirty();
        state.timeline.insert(change);
        if redraw {
            renderer.redraw_timeline();
        }
    }

    pub fn remove_bpm_change(&mut self, change: &BpmChange, redraw: bool) {
        let Some((state, renderer)) = self.active_parts() else {
            return;
        };
        state.mark_dirty();
        state.timeline.remove(change);
        if redraw {
            renderer.redraw_timeline();
        }
    }

    pub fn add_bookmark(&mut self, beat: f64, name: &str) -> Option<BookmarkId> {
        let (state, renderer) = self.active_parts()?;
        let bookmark = Bookmark::new(beat, name);
        let id = bookmark.id;
        state.mark_dirty();
        state.bookmarks.push(bookmark);
        renderer.redraw_timeline();
        Some(id)
    }

    pub fn remove_bookmark(&mut self, id: BookmarkId) -> bool {
        let Some((state, renderer)) = self.active_parts() else {
            return false;
        };
        let Some(pos) = state.bookmarks.iter().position(|b| b.id == id) else {
            return false;
        };
        state.mark_dirty();
        state.bookmarks.remove(pos);
        renderer.redraw_timeline();
        true
    }

    pub fn rename_bookmark(&mut self, id: BookmarkId, name: &str) -> bool {
        let Some((state, renderer)) = self.active_parts() else {
            return false;
        };
        let Some(bookmark) = state.bookmarks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        bookmark.name = name.to_string();
        state.mark_dirty();
        renderer.redraw_timeline();
        true
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Note Primitives
    // ─────────────────────────────────────────────────────────────────────────────

    /// Insert notes; only the ones actually added are drawn and recorded
    pub fn add_notes(&mut self, notes: &[Note], record: bool) {
        self.insert_notes(notes, record);
    }

    /// Returns whether a history step was pushed
    fn insert_notes(&mut self, notes: &[Note], record: bool) -> bool {
        let Some((state, renderer)) = self.active_parts() else {
            return false;
        };

        let inserted: Vec<Note> = notes
            .iter()
            .copied()
            .filter(|n| n.has_valid_column() && state.notes.insert_unique(*n))
            .collect();
        log::debug!("add_notes: {} of {} inserted", inserted.len(), notes.len());
        if inserted.is_empty() {
            return false;
        }

        state.mark_dirty();
        renderer.draw_notes(&inserted);
        if record {
            state.history.add(EditTransaction::single(Edit::insert(inserted)));
        }
        record
    }

    pub fn add_note(&mut self, note: Note) {
        self.add_notes(&[note], true);
    }

    /// Remove notes; absent ones are ignored
    pub fn remove_notes(&mut self, notes: &[Note], record: bool) {
        self.delete_notes(notes, record);
    }

    /// Returns whether a history step was pushed
    fn delete_notes(&mut self, notes: &[Note], record: bool) -> bool {
        let Some((state, renderer)) = self.active_parts() else {
            return false;
        };

        let removed = state.notes.remove(notes);
        log::debug!("remove_notes: {} of {} removed", removed.len(), notes.len());
        if removed.is_empty() {
            return false;
        }

        state.mark_dirty();
        renderer.undraw_notes(&removed);
        renderer.unhighlight_notes(&removed);
        for note in &removed {
            state.selection.remove(note);
        }
        if record {
            state.history.add(EditTransaction::single(Edit::delete(removed)));
        }
        record
    }

    /// Remove `note` if present, otherwise drop the selection
    pub fn remove_note(&mut self, note: Note) {
        let present = self
            .active_state()
            .is_some_and(|s| s.notes.contains(&note));
        if present {
            self.remove_notes(&[note], true);
        } else {
            self.unselect_all_notes();
        }
    }

    pub fn remove_selected_notes(&mut self, record: bool) {
        let selected = self.selected_notes().to_vec();
        self.remove_notes(&selected, record);
    }

    /// Replace `old` with `new` as one undoable step and select the result
    pub fn update_notes(&mut self, new: &[Note], old: &[Note], record: bool) {
        if self.active_state().is_none() {
            return;
        }

        let steps = self.delete_notes(old, record) as usize + self.insert_notes(new, record) as usize;
        if steps > 1 {
            if let Some(state) = self.active_state_mut() {
                state.history.consolidate(steps);
            }
        }
        self.select_new_notes(new);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────────

    /// Add existing notes to the selection
    pub fn select_notes(&mut self, notes: &[Note]) {
        let Some((state, renderer)) = self.active_parts() else {
            return;
        };
        let added: Vec<Note> = notes
            .iter()
            .copied()
            .filter(|n| state.notes.contains(n) && state.selection.insert(*n))
            .collect();
        renderer.highlight_notes(&added);
    }

    /// Replace the selection
    pub fn select_new_notes(&mut self, notes: &[Note]) {
        self.unselect_all_notes();
        self.select_notes(notes);
    }

    pub fn select_all_notes(&mut self) {
        let all = self.notes().to_vec();
        self.select_new_notes(&all);
    }

    pub fn toggle_selection(&mut self, note: Note) {
        let selected = self
            .active_state()
            .is_some_and(|s| s.selection.contains(&note));
        if selected {
            self.unselect_note(note);
        } else {
            self.select_notes(&[note]);
        }
    }

    pub fn unselect_note(&mut self, note: Note) {
        let Some((state, renderer)) = self.active_parts() else {
            return;
        };
        if state.selection.remove(&note) {
            renderer.unhighlight_notes(&[note]);
        }
    }

    pub fn unselect_all_notes(&mut self) {
        let Some((state, renderer)) = self.active_parts() else {
            return;
        };
        let previous = state.selection.take();
        if !previous.is_empty() {
            renderer.unhighlight_notes(&previous);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Clipboard
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn copy_selection(&mut self) {
        let Some(index) = self.active.index() else {
            return;
        };
        if let Some(state) = self.difficulties[index].as_ref() {
            self.clipboard.copy_from(state.selection.as_slice());
        }
    }

    pub fn cut_selection(&mut self) {
        if self.active_state().is_none() {
            return;
        }
        self.copy_selection();
        self.remove_selected_notes(true);
    }

    /// Paste so the first clipboard note lands on `beat_offset`.
    ///
    /// `col_start` moves the first note to that column (others keep their
    /// relative offset). Notes that would leave the song or the playfield are
    /// skipped; notes that collide with existing ones are not inserted.
    pub fn paste_clipboard(&mut self, beat_offset: f64, col_start: Option<u8>) {
        if self.active_state().is_none() || self.clipboard.is_empty() {
            return;
        }
        let notes = self
            .clipboard
            .paste_targets(beat_offset, col_start, self.timing.max_beat());
        self.add_notes(&notes, true);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Selection Transforms
    // ─────────────────────────────────────────────────────────────────────────────

    fn transform_selection<F>(&mut self, mut f: F)
    where
        F: FnMut(&Note, &BpmTimeline, &MapTiming, &mut ChaCha8Rng) -> Note,
    {
        let Some(index) = self.active.index() else {
            return;
        };
        let Some(state) = self.difficulties[index].as_ref() else {
            return;
        };

        let old = state.selection.as_slice().to_vec();
        if old.is_empty() {
            return;
        }
        let new: Vec<Note> = old
            .iter()
            .map(|n| f(n, &state.timeline, &self.timing, &mut self.rng))
            .collect();

        if new.iter().zip(&old).all(|(a, b)| a == b) {
            return;
        }
        self.update_notes(&new, &old, true);
    }

    /// Snap selected notes to the grid of their tempo segment
    pub fn quantize_selection(&mut self) {
        self.transform_selection(|note, timeline, timing, _| {
            note.with_beat(timeline.quantize(note.beat, timing))
        });
    }

    /// Move selected notes one beat or one grid cell
    pub fn shift_selection_by_beat(&mut self, direction: MoveDirection) {
        self.transform_selection(|note, timeline, timing, _| {
            let change = timeline.active_change_at(note.beat, timing);
            note.with_beat(note.beat + timing.shift_offset(direction, &change))
        });
    }

    /// Move selected notes `offset` columns, wrapping around the playfield
    pub fn shift_selection_by_column(&mut self, offset: i32) {
        self.transform_selection(|note, _, _, _| {
            let column = (note.column as i32 + offset).rem_euclid(COLUMN_COUNT as i32);
            note.with_column(column as u8)
        });
    }

    /// Flip selected notes left/right
    pub fn mirror_selection(&mut self) {
        self.transform_selection(|note, _, _, _| note.with_column(COLUMN_COUNT - 1 - note.column));
    }

    /// Give each selected note an independent random column
    pub fn randomize_selection(&mut self) {
        self.transform_selection(|note, _, _, rng| note.with_column(rng.random_range(0..COLUMN_COUNT)));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Undo/Redo
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn undo(&mut self) {
        let Some(state) = self.active_state_mut() else {
            return;
        };
        match state.history.undo() {
            Some(transaction) => self.apply_transaction(transaction),
            None => log::debug!("Nothing to undo"),
        }
    }

    pub fn redo(&mut self) {
        let Some(state) = self.active_state_mut() else {
            return;
        };
        match state.history.redo() {
            Some(transaction) => self.apply_transaction(transaction),
            None => log::debug!("Nothing to redo"),
        }
    }

    fn apply_transaction(&mut self, transaction: EditTransaction<Note>) {
        for edit in transaction.edits {
            match edit.kind {
                EditKind::Insert => self.add_notes(&edit.items, false),
                EditKind::Delete => self.remove_notes(&edit.items, false),
            }
        }
        self.unselect_all_notes();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Metadata
    // ─────────────────────────────────────────────────────────────────────────────

    fn resolve(&self, target: DifficultyRef) -> Option<usize> {
        match target {
            DifficultyRef::Current => self.active.index(),
            DifficultyRef::Index(i) => (i < self.store.num_difficulties()).then_some(i),
        }
    }

    fn mark_difficulty_dirty(&mut self, index: usize) {
        if let Some(state) = self.difficulties.get_mut(index).and_then(Option::as_mut) {
            state.mark_dirty();
        }
    }

    pub fn medal_distance(&self, medal: Medal, target: DifficultyRef) -> Option<i32> {
        let index = self.resolve(target)?;
        Some(self.store.medal_distance(index, medal))
    }

    pub fn set_medal_distance(&mut self, medal: Medal, distance: i32, target: DifficultyRef) {
        let Some(index) = self.resolve(target) else {
            log::warn!("No difficulty for medal distance {:?}", target);
            return;
        };
        self.mark_difficulty_dirty(index);
        self.store.set_medal_distance(index, medal, distance);
    }

    pub fn map_value(&self, key: &str, scope: MetadataScope) -> Option<MapValue> {
        match scope {
            MetadataScope::Global => self.store.global_value(key),
            MetadataScope::Difficulty { target, custom } => {
                let index = self.resolve(target)?;
                self.store.difficulty_value(index, key, custom)
            }
        }
    }

    pub fn set_map_value(&mut self, key: &str, value: MapValue, scope: MetadataScope) {
        match scope {
            MetadataScope::Global => {
                self.needs_save = true;
                self.store.set_global_value(key, value);
            }
            MetadataScope::Difficulty { target, custom } => {
                let Some(index) = self.resolve(target) else {
                    log::warn!("No difficulty for value {:?} ({:?})", key, target);
                    return;
                };
                self.mark_difficulty_dirty(index);
                self.store.set_difficulty_value(index, key, value, custom);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NullRenderer;
    use crate::storage::MemoryMapStore;

    fn editor(difficulties: usize) -> MapEditor<MemoryMapStore, NullRenderer> {
        let store = MemoryMapStore::with_difficulties(difficulties);
        MapEditor::new(store, NullRenderer, 120.0, 60.0, &EditorPreferences::default()).with_seed(42)
    }

    #[test]
    fn test_no_active_difficulty_is_noop() {
        let mut editor = editor(1);
        editor.add_note(Note::new(1.0, 0));
        editor.undo();
        editor.mirror_selection();
        editor.paste_clipboard(0.0, None);

        assert!(editor.notes().is_empty());
        assert!(editor.difficulty(0).unwrap().notes.is_empty());
        assert!(!editor.save_is_needed());
    }

    #[test]
    fn test_select_missing_difficulty() {
        let mut editor = editor(1);
        editor.select_difficulty(0);
        assert_eq!(editor.active_index(), Some(0));

        editor.select_difficulty(2);
        assert_eq!(editor.active_index(), None);
    }

    #[test]
    fn test_add_note_marks_dirty() {
        let mut editor = editor(1);
        editor.select_difficulty(0);
        editor.add_note(Note::new(1.0, 2));

        assert_eq!(editor.notes(), &[Note::new(1.0, 2)]);
        assert!(editor.save_is_needed());
        assert!(editor.can_undo());
    }

    #[test]
    fn test_invalid_column_dropped() {
        let mut editor = editor(1);
        editor.select_difficulty(0);
        editor.add_notes(&[Note::new(1.0, 4), Note::new(1.0, 3)], true);
        assert_eq!(editor.notes(), &[Note::new(1.0, 3)]);
    }

    #[test]
    fn test_remove_note_absent_clears_selection() {
        let mut editor = editor(1);
        editor.select_difficulty(0);
        editor.add_note(Note::new(1.0, 0));
        editor.select_all_notes();

        editor.remove_note(Note::new(9.0, 0));
        assert!(editor.selected_notes().is_empty());
        assert_eq!(editor.notes().len(), 1);
    }

    #[test]
    fn test_update_notes_is_one_step() {
        let mut editor = editor(1);
        editor.select_difficulty(0);
        editor.add_note(Note::new(1.0, 0));
        editor.select_all_notes();

        editor.mirror_selection();
        assert_eq!(editor.notes(), &[Note::new(1.0, 3)]);
        assert_eq!(editor.selected_notes(), &[Note::new(1.0, 3)]);
        assert_eq!(editor.active_difficulty().unwrap().history.undo_count(), 2);

        editor.undo();
        assert_eq!(editor.notes(), &[Note::new(1.0, 0)]);
        assert!(editor.selected_notes().is_empty());
    }

    #[test]
    fn test_randomize_keeps_beats() {
        let mut editor = editor(1);
        editor.select_difficulty(0);
        let notes: Vec<Note> = (0..16).map(|i| Note::new(i as f64, 0)).collect();
        editor.add_notes(&notes, true);
        editor.select_all_notes();

        editor.randomize_selection();
        assert_eq!(editor.notes().len(), 16);
        for (i, note) in editor.notes().iter().enumerate() {
            assert_eq!(note.beat, i as f64);
            assert!(note.has_valid_column());
        }
    }

    #[test]
    fn test_bookmarks() {
        let mut editor = editor(1);
        assert!(editor.add_bookmark(1.0, "Intro").is_none());

        editor.select_difficulty(0);
        let id = editor.add_bookmark(4.0, "Verse").unwrap();
        assert!(editor.rename_bookmark(id, "Chorus"));
        assert_eq!(editor.bookmarks()[0].name, "Chorus");

        assert!(editor.remove_bookmark(id));
        assert!(!editor.remove_bookmark(id));
        assert!(editor.bookmarks().is_empty());
    }

    #[test]
    fn test_bpm_changes() {
        let mut editor = editor(1);
        editor.select_difficulty(0);
        let change = BpmChange::new(8.0, 60.0, 2);
        editor.add_bpm_change(change, true);

        assert_eq!(editor.last_beat_change(8.0), change);
        assert_eq!(editor.last_beat_change(7.9).bpm, 120.0);

        editor.remove_bpm_change(&change, true);
        assert!(editor.bpm_changes().is_empty());
    }

    #[test]
    fn test_metadata_marks_dirty() {
        let mut editor = editor(2);
        editor.set_map_value(
            "_fog",
            MapValue::Bool(true),
            MetadataScope::Difficulty {
                target: DifficultyRef::Index(1),
                custom: true,
            },
        );
        assert!(editor.difficulty(1).unwrap().is_dirty());
        assert!(!editor.difficulty(0).unwrap().is_dirty());

        // No active difficulty: Current resolves to nothing
        editor.set_medal_distance(Medal::Gold, 500, DifficultyRef::Current);
        assert_eq!(editor.medal_distance(Medal::Gold, DifficultyRef::Current), None);

        editor.select_difficulty(0);
        editor.set_medal_distance(Medal::Gold, 500, DifficultyRef::Current);
        assert_eq!(editor.medal_distance(Medal::Gold, DifficultyRef::Index(0)), Some(500));
    }

    #[test]
    fn test_global_value_sets_map_dirty() {
        let mut editor = editor(1);
        editor.set_map_value("_songName", "Skald".into(), MetadataScope::Global);
        assert!(editor.save_is_needed());
        assert_eq!(
            editor.map_value("_songName", MetadataScope::Global),
            Some(MapValue::Text("Skald".into()))
        );

        editor.save_map().unwrap();
        assert!(!editor.save_is_needed());
    }
}
