//! bf-core: Shared chart types and timing math for BeatForge
//!
//! This crate provides the foundational types used by the editing crates:
//! notes, bookmarks, the BPM timeline and grid quantization.

mod error;
mod note;
mod tempo;

pub use error::*;
pub use note::*;
pub use tempo::*;
