//! Editor Preferences
//!
//! Persistent settings for the editing core:
//! - Undo history depth
//! - Default grid division
//! - Optional fixed seed for column randomization

use bf_core::{BfResult, DEFAULT_GRID_DIVISION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Editing preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    /// Undoable steps kept per difficulty
    pub history_capacity: usize,
    /// Grid cells per beat when no BPM change applies
    pub default_grid_division: u32,
    /// Seed for `randomize_selection` (None = random per session)
    pub random_seed: Option<u64>,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_grid_division: DEFAULT_GRID_DIVISION,
            random_seed: None,
        }
    }
}

impl EditorPreferences {
    /// Load preferences from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load preferences from specified path, falling back to defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Invalid preferences file {:?}: {}", path.as_ref(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to standard location
    pub fn save(&self) -> BfResult<()> {
        self.save_to(Self::default_path())
    }

    /// Save preferences to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> BfResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Get default preferences file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("beatforge"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("editor.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = EditorPreferences::default();
        assert_eq!(prefs.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(prefs.default_grid_division, 4);
        assert!(prefs.random_seed.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let prefs: EditorPreferences = serde_json::from_str(r#"{"history_capacity": 8}"#).unwrap();
        assert_eq!(prefs.history_capacity, 8);
        assert_eq!(prefs.default_grid_division, 4);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("editor.json");

        let prefs = EditorPreferences {
            history_capacity: 32,
            default_grid_division: 3,
            random_seed: Some(7),
        };
        prefs.save_to(&path).unwrap();

        assert_eq!(EditorPreferences::load_from(&path), prefs);
    }

    #[test]
    fn test_missing_or_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(EditorPreferences::load_from(&missing), EditorPreferences::default());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert_eq!(EditorPreferences::load_from(&corrupt), EditorPreferences::default());
    }
}
