//! Shared daemon state: the aggregation engine behind a mutex.
//!
//! Connection handler threads serialize on the mutex, so observations
//! are folded into the track set in arrival order and each
//! prune-merge-store unit is atomic from a reader's perspective.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use tally_core::{duration, Engine, EngineConfig, SlotStore, StorageConfig};
use tally_daemon_protocol::{EventEnvelope, EventKind};

pub struct SharedState {
    engine: Mutex<Engine>,
}

/// One row of the ranked track list, ready for display.
#[derive(Debug, Serialize)]
pub struct TrackRow {
    pub class: String,
    pub name: String,
    pub spent: String,
}

#[derive(Debug, Serialize)]
pub struct TracksSnapshot {
    pub rows: Vec<TrackRow>,
    /// Idle status passthrough, present while the stream reports idle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<String>,
    /// Non-fatal persistence warning from the last store attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassRow {
    pub class: String,
    pub spent: String,
}

#[derive(Debug, Serialize)]
pub struct ClassesSnapshot {
    pub rows: Vec<ClassRow>,
    /// Grand total across every class, formatted.
    pub total: String,
}

impl SharedState {
    pub fn new(storage: &StorageConfig, config: EngineConfig) -> Self {
        let store = SlotStore::new(storage.tracks_file());
        Self {
            engine: Mutex::new(Engine::new(Box::new(store), config, Utc::now())),
        }
    }

    fn engine(&self) -> MutexGuard<'_, Engine> {
        match self.engine.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Applies one validated event envelope.
    pub fn apply_event(&self, envelope: &EventEnvelope) {
        let mut engine = self.engine();
        match envelope.kind {
            EventKind::Seen => {
                if let Some(obs) = envelope.observation.as_ref() {
                    engine.observe(obs, Utc::now());
                }
            }
            EventKind::Idle => {
                if let Some(status) = envelope.status.as_deref() {
                    engine.idle(status);
                }
            }
        }
    }

    /// Periodic sweep: expire stale tracks and re-store, so the display
    /// shrinks even without new observations.
    pub fn maintain(&self) {
        self.engine().maintain(Utc::now());
    }

    pub fn tracks_snapshot(&self) -> TracksSnapshot {
        let engine = self.engine();
        TracksSnapshot {
            rows: engine
                .tracks()
                .iter()
                .map(|track| TrackRow {
                    class: track.class.clone(),
                    name: track.name.clone(),
                    spent: duration::format(track.active),
                })
                .collect(),
            idle: engine.idle_status().map(str::to_string),
            warning: engine.store_warning().map(str::to_string),
        }
    }

    pub fn classes_snapshot(&self) -> ClassesSnapshot {
        let rollup = self.engine().rollup();
        ClassesSnapshot {
            rows: rollup
                .classes
                .iter()
                .map(|class| ClassRow {
                    class: class.class.clone(),
                    spent: duration::format(class.active),
                })
                .collect(),
            total: duration::format(rollup.total),
        }
    }

    pub fn clear(&self) -> Result<(), String> {
        self.engine().clear().map_err(|err| err.to_string())
    }

    pub fn track_count(&self) -> usize {
        self.engine().tracks().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Observation;
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> SharedState {
        let storage = StorageConfig::with_root(dir.path().to_path_buf());
        SharedState::new(&storage, EngineConfig::default())
    }

    fn seen(class: &str, name: &str, active: u64) -> EventEnvelope {
        EventEnvelope {
            kind: EventKind::Seen,
            observation: Some(Observation {
                class: class.to_string(),
                name: name.to_string(),
                active,
                seen: Utc::now().to_rfc3339(),
            }),
            status: None,
        }
    }

    #[test]
    fn snapshot_rows_are_ranked_and_formatted() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        state.apply_event(&seen("cpu", "x", 5_000_000_000));
        state.apply_event(&seen("mem", "y", 61_000_000_000));

        let snapshot = state.tracks_snapshot();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.rows[0].name, "y");
        assert_eq!(snapshot.rows[0].spent, "1m1s");
        assert_eq!(snapshot.rows[1].spent, "5s");
        assert!(snapshot.idle.is_none());
    }

    #[test]
    fn classes_snapshot_includes_grand_total() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        state.apply_event(&seen("cpu", "x", 5_000_000_000));
        state.apply_event(&seen("cpu", "z", 3_000_000_000));
        state.apply_event(&seen("mem", "y", 10_000_000_000));

        let snapshot = state.classes_snapshot();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.total, "18s");
    }

    #[test]
    fn idle_event_surfaces_in_tracks_snapshot() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        state.apply_event(&EventEnvelope {
            kind: EventKind::Idle,
            observation: None,
            status: Some("away from keyboard".to_string()),
        });

        assert_eq!(
            state.tracks_snapshot().idle.as_deref(),
            Some("away from keyboard")
        );
    }

    #[test]
    fn clear_resets_everything() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        state.apply_event(&seen("cpu", "x", 5_000_000_000));
        state.clear().unwrap();

        assert_eq!(state.track_count(), 0);
        assert!(!dir.path().join("tracks.json").exists());
    }

    #[test]
    fn state_survives_reload_without_duplication() {
        let dir = TempDir::new().unwrap();
        {
            let state = state(&dir);
            state.apply_event(&seen("cpu", "x", 5_000_000_000));
            state.apply_event(&seen("cpu", "x", 3_000_000_000));
        }

        let reloaded = state(&dir);
        let snapshot = reloaded.tracks_snapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].spent, "8s");
    }
}
