//! Persistence adapter: a single JSON slot holding the serialized track set.
//!
//! # Defensive Design
//!
//! Loading never fails: a missing, empty, or corrupt slot degrades to an
//! empty track set with a logged warning, so accumulated state can only
//! grow from observations, never crash the process. Write failures are
//! returned to the caller; the in-memory set remains authoritative for
//! the session and the engine surfaces a warning instead.
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a crash mid-write leaves the previous slot
//! contents intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, TallyError};
use crate::track::TrackSet;

/// Contract between the engine and durable storage.
///
/// The slot is single-writer: only the engine's store step writes it.
/// Concurrent processes sharing one slot are not supported.
pub trait TrackStore {
    /// Loads the persisted track set. Fails soft: absent or malformed
    /// contents yield an empty set, never an error.
    fn load(&self) -> TrackSet;

    /// Persists the track set, replacing the previous slot contents.
    fn store(&self, tracks: &TrackSet) -> Result<()>;

    /// Removes the slot. User-triggered, parameterless reset.
    fn clear(&self) -> Result<()>;
}

/// File-backed slot store; the production [`TrackStore`].
#[derive(Debug, Clone)]
pub struct SlotStore {
    path: PathBuf,
}

impl SlotStore {
    pub fn new(path: PathBuf) -> Self {
        SlotStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackStore for SlotStore {
    fn load(&self) -> TrackSet {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return TrackSet::new(),
        };

        if content.trim().is_empty() {
            return TrackSet::new();
        }

        match serde_json::from_str::<TrackSet>(&content) {
            Ok(mut tracks) => {
                tracks.retain_valid();
                tracks
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "Corrupt track slot; starting from an empty set"
                );
                TrackSet::new()
            }
        }
    }

    fn store(&self, tracks: &TrackSet) -> Result<()> {
        let content = serde_json::to_string_pretty(tracks).map_err(|err| TallyError::Json {
            context: "serialize track set".to_string(),
            source: err,
        })?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| TallyError::SlotPathInvalid(self.path.clone()))?;
        fs::create_dir_all(parent).map_err(|err| TallyError::Io {
            context: format!("create slot directory {}", parent.display()),
            source: err,
        })?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|err| TallyError::Io {
            context: "create temp slot file".to_string(),
            source: err,
        })?;
        temp.write_all(content.as_bytes())
            .map_err(|err| TallyError::Io {
                context: "write temp slot file".to_string(),
                source: err,
            })?;
        temp.flush().map_err(|err| TallyError::Io {
            context: "flush temp slot file".to_string(),
            source: err,
        })?;
        temp.persist(&self.path).map_err(|err| TallyError::Io {
            context: format!("rename temp slot file to {}", self.path.display()),
            source: err.error,
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(TallyError::Io {
                context: format!("remove slot {}", self.path.display()),
                source: err,
            }),
        }
    }
}
