//! Local storage for the decoded MIDI artifact.
//!
//! One fixed slot per device: each successful analysis overwrites the
//! previous artifact.

use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Filename of the artifact slot.
pub const ARTIFACT_FILENAME: &str = "recording.mid";

/// Single-slot artifact storage.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    /// The default slot: `hum/recording.mid` under the user's documents
    /// directory, falling back to the home directory where the platform has
    /// no documents concept.
    pub fn in_documents() -> Self {
        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("hum").join(ARTIFACT_FILENAME),
        }
    }

    /// A slot at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the artifact, replacing any previous one.
    pub fn write(&self, bytes: &[u8]) -> Result<PathBuf, SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SessionError::StorageWriteFailed(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }

        std::fs::write(&self.path, bytes).map_err(|e| {
            SessionError::StorageWriteFailed(format!("failed to write {}: {e}", self.path.display()))
        })?;

        crate::verbose!(
            "stored artifact ({} bytes) at {}",
            bytes.len(),
            self.path.display()
        );
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::at(dir.path().join("nested").join(ARTIFACT_FILENAME));

        let path = store.write(b"MThd").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"MThd");
    }

    #[test]
    fn write_overwrites_the_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::at(dir.path().join(ARTIFACT_FILENAME));

        store.write(b"first").unwrap();
        store.write(b"second").unwrap();
        assert_eq!(std::fs::read(store.path()).unwrap(), b"second");
    }

    #[test]
    fn write_into_an_unwritable_location_is_a_storage_failure() {
        // A path whose parent is a regular file cannot be created.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let store = ArtifactStore::at(blocker.join(ARTIFACT_FILENAME));
        let err = store.write(b"MThd").unwrap_err();
        assert!(matches!(err, SessionError::StorageWriteFailed(_)));
    }
}
