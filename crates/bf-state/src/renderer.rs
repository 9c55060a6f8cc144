//! Grid renderer collaborator
//!
//! The editor reports exactly which notes changed so a view can update
//! incrementally instead of redrawing the whole grid.

use bf_core::Note;

/// Receiver of draw notifications
pub trait GridRenderer {
    fn draw_notes(&mut self, notes: &[Note]);
    fn undraw_notes(&mut self, notes: &[Note]);
    fn highlight_notes(&mut self, notes: &[Note]);
    fn unhighlight_notes(&mut self, notes: &[Note]);
    /// Markers (BPM changes, bookmarks) or the beat mapping changed
    fn redraw_timeline(&mut self);
    /// Difficulty slots were added, removed or reordered
    fn difficulty_slots_changed(&mut self);
}

/// Renderer that ignores every notification (headless use)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl GridRenderer for NullRenderer {
    fn draw_notes(&mut self, _notes: &[Note]) {}
    fn undraw_notes(&mut self, _notes: &[Note]) {}
    fn highlight_notes(&mut self, _notes: &[Note]) {}
    fn unhighlight_notes(&mut self, _notes: &[Note]) {}
    fn redraw_timeline(&mut self) {}
    fn difficulty_slots_changed(&mut self) {}
}
