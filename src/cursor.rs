//! Reindex cursor persistence.
//!
//! The cursor is stored as a small JSON record next to the store. It is
//! rewritten (temp file + rename) after setup and after every step, and
//! removed when the job finishes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solr_bridge_core::reindex::ReindexCursor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorRecord {
    pub cursor: ReindexCursor,
    pub updated_at: DateTime<Utc>,
}

pub struct CursorFile {
    path: PathBuf,
}

impl CursorFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The persisted record, or `None` when no job is in progress.
    pub fn load(&self) -> Result<Option<CursorRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read reindex cursor: {}", self.path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt reindex cursor: {}", self.path.display()))?;
        Ok(Some(record))
    }

    pub fn save(&self, cursor: &ReindexCursor) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cursor directory: {}", parent.display())
                })?;
            }
        }
        let record = CursorRecord {
            cursor: cursor.clone(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write reindex cursor: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace reindex cursor: {}", self.path.display()))?;
        Ok(())
    }

    /// Remove the cursor. Missing files are fine.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove reindex cursor: {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = CursorFile::new(dir.path().join("state/cursor.json"));
        assert!(file.load().unwrap().is_none());

        let cursor = ReindexCursor {
            pending_classes: vec!["B".to_string()],
            current_class: Some("A".to_string()),
            last_seen_id: 127,
            steps_done: 127,
            steps_total: 260,
        };
        file.save(&cursor).unwrap();
        let record = file.load().unwrap().unwrap();
        assert_eq!(record.cursor, cursor);
        assert!(!dir.path().join("state/cursor.json.tmp").exists());

        assert!(file.clear().unwrap());
        assert!(!file.clear().unwrap());
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_cursor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = CursorFile::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Corrupt reindex cursor"));
    }
}
