//! bf-state: Editing state for BeatForge maps
//!
//! Provides the editor facade and the state it is built from:
//! - Bounded undo/redo of note edits
//! - Sorted note sets, selection and clipboard
//! - Per-difficulty state and the map store seam
//! - Renderer notifications and editor preferences

mod difficulty;
mod editor;
mod history;
mod notes;
mod preferences;
mod renderer;
mod storage;

pub use difficulty::*;
pub use editor::*;
pub use history::*;
pub use notes::*;
pub use preferences::*;
pub use renderer::*;
pub use storage::*;
