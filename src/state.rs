use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Minimal persisted record so subsequent invocations can re-attach.
/// Overwritten wholesale on every successful attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub workbook: String,
    pub header_row: u32,
}

impl SessionState {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetsql")
            .join("state.json")
    }

    pub fn load(path: &Path) -> Option<Self> {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("could not write '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let state = SessionState {
            workbook: "/tmp/orders.xlsx".to_string(),
            header_row: 3,
        };
        state.save(&path).unwrap();

        let loaded = SessionState::load(&path).expect("state loads");
        assert_eq!(loaded.workbook, state.workbook);
        assert_eq!(loaded.header_row, 3);
    }

    #[test]
    fn missing_or_corrupt_state_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert!(SessionState::load(&path).is_none());
        fs::write(&path, "not json").unwrap();
        assert!(SessionState::load(&path).is_none());
    }
}
