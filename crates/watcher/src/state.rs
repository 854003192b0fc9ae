//! Persisted last-seen marker.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::twitter::PostId;

/// The record carried between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Id of the newest original post already processed.
    #[serde(default)]
    pub last_seen_id: Option<PostId>,
    /// When the record was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StateRecord {
    /// Record with the given marker.
    #[must_use]
    pub fn with_marker(id: PostId) -> Self {
        Self {
            last_seen_id: Some(id),
            updated_at: None,
        }
    }

    /// True before the first successful run.
    #[must_use]
    pub fn is_uninitialized(&self) -> bool {
        self.last_seen_id.is_none()
    }
}

/// JSON file holding a single [`StateRecord`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record. A missing file is an empty record, not an error.
    pub fn load(&self) -> Result<StateRecord, StateError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No state file, starting fresh");
                return Ok(StateRecord::default());
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| StateError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the record on disk.
    ///
    /// The JSON is written to a temporary file next to the target and renamed
    /// over it, so readers see either the old or the new record.
    pub fn save(&self, record: &StateRecord) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(record)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_err = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        tracing::debug!(
            path = %self.path.display(),
            last_seen_id = ?record.last_seen_id.map(|id| id.to_string()),
            "Saved state"
        );
        Ok(())
    }

    /// Remove the state file. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, StateError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StateError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        let record = store.load().unwrap();
        assert!(record.is_uninitialized());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/state.json"));

        let mut record = StateRecord::with_marker(PostId::new(105));
        record.updated_at = Some(Utc::now());
        store.save(&record).unwrap();

        assert_eq!(store.load().unwrap(), record);
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::new(&path);

        store.save(&StateRecord::with_marker(PostId::new(100))).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"last_seen_id": "100"}));

        store.save(&StateRecord::default()).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"last_seen_id": null}));
    }

    #[test]
    fn test_load_accepts_null_and_missing_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::new(&path);

        std::fs::write(&path, r#"{"last_seen_id": null}"#).unwrap();
        assert!(store.load().unwrap().is_uninitialized());

        std::fs::write(&path, "{}").unwrap();
        assert!(store.load().unwrap().is_uninitialized());

        std::fs::write(&path, r#"{"last_seen_id": "42", "extra": true}"#).unwrap();
        assert_eq!(store.load().unwrap().last_seen_id, Some(PostId::new(42)));
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StateError::Malformed { .. }));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.save(&StateRecord::with_marker(PostId::new(1))).unwrap();
        store.save(&StateRecord::with_marker(PostId::new(2))).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.load().unwrap().last_seen_id, Some(PostId::new(2)));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        assert!(!store.clear().unwrap());
        store.save(&StateRecord::with_marker(PostId::new(1))).unwrap();
        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_uninitialized());
    }
}
