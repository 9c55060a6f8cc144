//! Notes and Bookmarks
//!
//! Chart events placed on the global beat axis:
//! - Notes (one hit in one of four columns)
//! - Bookmarks (named beat positions)
//!
//! ## Global Beats
//! Every position is stored in global beats, a tempo-independent axis defined
//! by the map's global BPM. Local tempo changes only affect the editing grid.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of note columns (valid columns are 0..COLUMN_COUNT)
pub const COLUMN_COUNT: u8 = 4;

/// Tolerance for beat comparisons
pub const BEAT_EPSILON: f64 = 1e-6;

/// Epsilon-tolerant float equality used for every beat comparison
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < BEAT_EPSILON
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTE
// ═══════════════════════════════════════════════════════════════════════════════

/// A single note: a beat position and a column
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Note {
    /// Position in global beats
    pub beat: f64,
    /// Column (0-3)
    pub column: u8,
}

impl Note {
    pub fn new(beat: f64, column: u8) -> Self {
        Self { beat, column }
    }

    /// Row index of the beat on a [`BEAT_EPSILON`] grid
    #[inline]
    pub fn row_key(&self) -> i64 {
        (self.beat / BEAT_EPSILON).round() as i64
    }

    /// Canonical chart order: row ascending, then column.
    ///
    /// Beats are snapped to rows of [`BEAT_EPSILON`] before comparing so the
    /// order stays total and transitive; binary search in sorted note lists
    /// depends on that.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.row_key()
            .cmp(&other.row_key())
            .then(self.column.cmp(&other.column))
    }

    /// Is the column inside the playfield
    pub fn has_valid_column(&self) -> bool {
        self.column < COLUMN_COUNT
    }

    /// Copy with a different beat
    pub fn with_beat(self, beat: f64) -> Self {
        Self { beat, ..self }
    }

    /// Copy with a different column
    pub fn with_column(self, column: u8) -> Self {
        Self { column, ..self }
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.canonical_cmp(other))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BOOKMARK
// ═══════════════════════════════════════════════════════════════════════════════

/// Bookmark ID
pub type BookmarkId = u64;

static NEXT_BOOKMARK_ID: AtomicU64 = AtomicU64::new(1);

fn new_bookmark_id() -> BookmarkId {
    NEXT_BOOKMARK_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

/// A named position on the beat axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Identity (rename/remove target)
    #[serde(skip, default = "new_bookmark_id")]
    pub id: BookmarkId,
    /// Position in global beats
    pub beat: f64,
    /// Display name
    pub name: String,
}

impl Bookmark {
    pub fn new(beat: f64, name: &str) -> Self {
        Self {
            id: new_bookmark_id(),
            beat,
            name: name.to_string(),
        }
    }

    /// Copy of this bookmark with a fresh identity
    pub fn duplicate(&self) -> Self {
        Self::new(self.beat, &self.name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let mut notes = vec![
            Note::new(1.0, 2),
            Note::new(0.5, 3),
            Note::new(1.0, 0),
            Note::new(0.0, 1),
        ];
        notes.sort_by(Note::canonical_cmp);

        assert_eq!(notes[0], Note::new(0.0, 1));
        assert_eq!(notes[1], Note::new(0.5, 3));
        assert_eq!(notes[2], Note::new(1.0, 0));
        assert_eq!(notes[3], Note::new(1.0, 2));
    }

    #[test]
    fn test_epsilon_equality() {
        let a = Note::new(0.25, 1);
        let b = Note::new(0.25 + BEAT_EPSILON / 10.0, 1);
        let c = Note::new(0.25, 2);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_order_is_transitive_near_epsilon() {
        // Neighbouring beats less than BEAT_EPSILON apart in different columns
        let a = Note::new(1.0, 3);
        let b = Note::new(1.0 + 0.8 * BEAT_EPSILON, 0);
        let c = Note::new(1.0 + 1.6 * BEAT_EPSILON, 1);

        let ab = a.canonical_cmp(&b);
        let bc = b.canonical_cmp(&c);
        assert_eq!(ab, bc);
        assert_eq!(a.canonical_cmp(&c), ab);
    }

    #[test]
    fn test_valid_column() {
        assert!(Note::new(0.0, 3).has_valid_column());
        assert!(!Note::new(0.0, 4).has_valid_column());
    }

    #[test]
    fn test_bookmark_identity() {
        let a = Bookmark::new(4.0, "Drop");
        let b = a.duplicate();

        assert_ne!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.beat, b.beat);
    }
}
