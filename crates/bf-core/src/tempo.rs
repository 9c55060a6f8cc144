//! Tempo Timeline and Grid Math
//!
//! Local tempo management for the editing grid:
//! - BPM change markers (ordered by global beat)
//! - Active change lookup
//! - Grid lengths per local tempo/division
//! - Segment-relative quantization
//! - Global beat ↔ seconds conversion
//!
//! ## Time Units
//! - Global beats: tempo-independent position, defined by the map's global BPM
//! - Grid cells: `1 / division` of a local beat at the active tempo
//! - Seconds: real time (`beat * 60 / global_bpm`)

use serde::{Deserialize, Serialize};

use crate::note::{approx_eq, BEAT_EPSILON};

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default global tempo
pub const DEFAULT_BPM: f64 = 120.0;

/// Default grid division (cells per beat)
pub const DEFAULT_GRID_DIVISION: u32 = 4;

// ═══════════════════════════════════════════════════════════════════════════════
// BPM CHANGE
// ═══════════════════════════════════════════════════════════════════════════════

/// Tempo change marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpmChange {
    /// Position in global beats
    pub global_beat: f64,
    /// Local tempo
    pub bpm: f64,
    /// Grid cells per local beat
    pub grid_division: u32,
}

impl BpmChange {
    pub fn new(global_beat: f64, bpm: f64, grid_division: u32) -> Self {
        Self {
            global_beat,
            bpm,
            grid_division: grid_division.max(1),
        }
    }

    /// Positive finite tempo at a finite, non-negative position
    pub fn is_valid(&self) -> bool {
        self.bpm.is_finite() && self.bpm > 0.0 && self.global_beat.is_finite() && self.global_beat >= 0.0
    }
}

/// Direction for grid-aligned moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    /// One local beat later
    BeatUp,
    /// One local beat earlier
    BeatDown,
    /// One grid cell later
    GridUp,
    /// One grid cell earlier
    GridDown,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAP TIMING
// ═══════════════════════════════════════════════════════════════════════════════

/// Map-wide timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapTiming {
    /// Global tempo (defines the global beat axis)
    pub global_bpm: f64,
    /// Song length in seconds
    pub song_duration: f64,
    /// Grid division used when no BPM change applies
    pub default_grid_division: u32,
}

impl Default for MapTiming {
    fn default() -> Self {
        Self {
            global_bpm: DEFAULT_BPM,
            song_duration: 0.0,
            default_grid_division: DEFAULT_GRID_DIVISION,
        }
    }
}

impl MapTiming {
    pub fn new(global_bpm: f64, song_duration: f64, default_grid_division: u32) -> Self {
        Self {
            global_bpm,
            song_duration,
            default_grid_division: default_grid_division.max(1),
        }
    }

    /// Fraction of a global beat spanned by one grid cell at a local tempo
    #[inline]
    pub fn grid_length(&self, bpm: f64, division: u32) -> f64 {
        let scale = self.global_bpm / bpm;
        scale / division.max(1) as f64
    }

    /// Last placeable global beat
    #[inline]
    pub fn max_beat(&self) -> f64 {
        self.global_bpm * self.song_duration / 60.0
    }

    /// Is the beat inside `[0, max_beat]`
    pub fn contains_beat(&self, beat: f64) -> bool {
        beat >= 0.0 && beat <= self.max_beat()
    }

    /// Convert global beats to seconds
    #[inline]
    pub fn beat_to_seconds(&self, beat: f64) -> f64 {
        beat * 60.0 / self.global_bpm
    }

    /// Convert seconds to global beats
    #[inline]
    pub fn seconds_to_beat(&self, seconds: f64) -> f64 {
        seconds * self.global_bpm / 60.0
    }

    /// Change assumed active before any explicit marker
    pub fn default_change(&self) -> BpmChange {
        BpmChange::new(0.0, self.global_bpm, self.default_grid_division)
    }

    /// Snap a beat to the grid of `change`.
    ///
    /// The grid is anchored on the change's own beat when that beat is past
    /// zero, so each tempo segment quantizes relative to where it starts.
    /// Beats already on a grid line (or one cell before the computed line)
    /// come back unchanged.
    pub fn quantize_beat(&self, beat: f64, change: &BpmChange) -> f64 {
        let grid = self.grid_length(change.bpm, change.grid_division);

        let offset = if change.global_beat > 0.0 {
            change.global_beat - (change.global_beat / grid).floor() * grid
        } else {
            0.0
        };

        let snapped = (beat / grid).round() * grid + offset;
        if approx_eq(beat, snapped) || approx_eq(beat, snapped - grid) {
            beat
        } else {
            snapped
        }
    }

    /// Beat delta for a grid-aligned move under `change`
    pub fn shift_offset(&self, direction: MoveDirection, change: &BpmChange) -> f64 {
        match direction {
            MoveDirection::BeatUp => self.grid_length(change.bpm, 1),
            MoveDirection::BeatDown => -self.grid_length(change.bpm, 1),
            MoveDirection::GridUp => self.grid_length(change.bpm, change.grid_division),
            MoveDirection::GridDown => -self.grid_length(change.bpm, change.grid_division),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BPM TIMELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered set of tempo changes for one difficulty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BpmTimeline {
    /// Changes (sorted by global beat)
    changes: Vec<BpmChange>,
}

impl BpmTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an unordered list; invalid changes are dropped
    pub fn from_changes(mut changes: Vec<BpmChange>) -> Self {
        changes.retain(BpmChange::is_valid);
        let mut timeline = Self { changes };
        timeline.sort();
        timeline
    }

    /// Change with the greatest `global_beat <= beat`, or the map default
    pub fn active_change_at(&self, beat: f64, timing: &MapTiming) -> BpmChange {
        self.changes
            .iter()
            .rev()
            .find(|c| c.global_beat <= beat)
            .copied()
            .unwrap_or_else(|| timing.default_change())
    }

    /// First change strictly after `beat`
    pub fn next_change_after(&self, beat: f64) -> Option<BpmChange> {
        self.changes.iter().find(|c| c.global_beat > beat).copied()
    }

    /// Snap `beat` to the grid of its own tempo segment.
    ///
    /// A snap that would cross into the next segment steps back by whole
    /// grid cells, so quantizing the result again leaves it in place.
    pub fn quantize(&self, beat: f64, timing: &MapTiming) -> f64 {
        let change = self.active_change_at(beat, timing);
        let mut snapped = timing.quantize_beat(beat, &change);

        let grid = timing.grid_length(change.bpm, change.grid_division);
        if !(grid.is_finite() && grid > 0.0) {
            return snapped;
        }
        if let Some(next) = self.next_change_after(beat) {
            while snapped >= next.global_beat - BEAT_EPSILON
                && snapped - grid >= change.global_beat - BEAT_EPSILON
            {
                snapped -= grid;
            }
        }
        snapped
    }

    /// Insert a change, keeping beat order; invalid changes are refused
    pub fn insert(&mut self, change: BpmChange) -> bool {
        if !change.is_valid() {
            return false;
        }
        self.changes.push(change);
        self.sort();
        true
    }

    /// Remove the first change equal to `change`
    pub fn remove(&mut self, change: &BpmChange) -> bool {
        match self.changes.iter().position(|c| c == change) {
            Some(idx) => {
                self.changes.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Multiply every change position by `factor`
    pub fn scale_beats(&mut self, factor: f64) {
        for change in &mut self.changes {
            change.global_beat *= factor;
        }
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// All changes in beat order
    pub fn changes(&self) -> &[BpmChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn sort(&mut self) {
        self.changes
            .sort_by(|a, b| a.global_beat.total_cmp(&b.global_beat));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
