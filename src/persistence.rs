//! Whole-collection JSON snapshots on disk.
//!
//! Each snapshot is a single pretty-printed JSON file under the storage root.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never sees a half-written snapshot.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed snapshot {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and writes named snapshots under a root directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a named snapshot
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Load a snapshot.
    ///
    /// Returns `Ok(None)` when the file does not exist or is empty, and
    /// `PersistenceError::Malformed` when it cannot be decoded.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, PersistenceError> {
        let path = self.path_of(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}, starting empty", path.display());
                return Ok(None);
            }
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!("Snapshot {} is empty, starting empty", path.display());
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PersistenceError::Malformed { path, source })
    }

    /// Replace a snapshot with the pretty-printed JSON of `payload`.
    pub fn write<T: Serialize>(&self, name: &str, payload: &T) -> Result<(), PersistenceError> {
        let path = self.path_of(name);
        let json = serde_json::to_vec_pretty(payload).map_err(|source| {
            PersistenceError::Malformed {
                path: path.clone(),
                source,
            }
        })?;

        fs::create_dir_all(&self.root).map_err(|source| PersistenceError::Io {
            path: self.root.clone(),
            source,
        })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).map_err(|source| PersistenceError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| PersistenceError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_snapshot_is_cold_start() {
        let dir = TempDir::new().unwrap();
        let snapshots = SnapshotStore::new(dir.path());
        let loaded: Option<HashMap<String, String>> = snapshots.read("users.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_empty_snapshot_is_cold_start() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("users.json"), "  \n").unwrap();
        let snapshots = SnapshotStore::new(dir.path());
        let loaded: Option<HashMap<String, String>> = snapshots.read("users.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("users.json"), "{ not json").unwrap();
        let snapshots = SnapshotStore::new(dir.path());
        let result: Result<Option<HashMap<String, String>>, _> = snapshots.read("users.json");
        assert!(matches!(result, Err(PersistenceError::Malformed { .. })));
    }

    #[test]
    fn test_write_is_pretty_and_readable() {
        let dir = TempDir::new().unwrap();
        let snapshots = SnapshotStore::new(dir.path().join("nested"));
        let payload = HashMap::from([("A1".to_string(), "Jane".to_string())]);

        snapshots.write("users.json", &payload).unwrap();

        let raw = fs::read_to_string(snapshots.path_of("users.json")).unwrap();
        assert!(raw.contains("\n  \"A1\": \"Jane\""));
        assert!(!snapshots.path_of("users.json.tmp").exists());

        let loaded: HashMap<String, String> = snapshots.read("users.json").unwrap().unwrap();
        assert_eq!(loaded, payload);
    }
}
