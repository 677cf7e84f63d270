//! The aggregation engine: load, prune, merge, store.
//!
//! [`Engine`] owns the in-memory track set and threads every state
//! transition through one place, replacing the ambient globals of older
//! trackers. Each call to [`Engine::observe`] runs prune, merge, and
//! store as one logical unit; callers serialize access (the daemon holds
//! the engine behind a mutex), so readers never see a partially merged
//! set.

use chrono::{DateTime, Utc};

use crate::retention::DEFAULT_WINDOW_HOURS;
use crate::rollup::{rollup, ClassRollup};
use crate::store::TrackStore;
use crate::track::{Observation, TrackSet};

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trailing retention window in hours; tracks not seen within it are
    /// pruned.
    pub window_hours: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

/// Owns the current track set and its persistence.
pub struct Engine {
    tracks: TrackSet,
    store: Box<dyn TrackStore + Send>,
    config: EngineConfig,
    idle: Option<String>,
    store_warning: Option<String>,
}

impl Engine {
    /// Seeds the engine from durable storage: load, then prune against
    /// `now`. The initial display needs no observation to populate.
    pub fn new(store: Box<dyn TrackStore + Send>, config: EngineConfig, now: DateTime<Utc>) -> Self {
        let tracks = store.load().prune(config.window_hours, now);
        Self {
            tracks,
            store,
            config,
            idle: None,
            store_warning: None,
        }
    }

    /// Applies one observation: prune stale tracks, fold the observation
    /// in, persist the result.
    ///
    /// A persistence failure is non-fatal: the in-memory set stays
    /// authoritative for the session and the failure is kept as a warning
    /// for the presentation layer.
    pub fn observe(&mut self, obs: &Observation, now: DateTime<Utc>) {
        self.idle = None;
        self.tracks = self.tracks.prune(self.config.window_hours, now);
        self.tracks.merge(obs);
        self.persist();
    }

    /// Periodic maintenance sweep: prune and re-store so stale tracks
    /// disappear even without new observations.
    pub fn maintain(&mut self, now: DateTime<Utc>) {
        let pruned = self.tracks.prune(self.config.window_hours, now);
        if pruned != self.tracks {
            self.tracks = pruned;
            self.persist();
        }
    }

    /// Records an opaque idle status for display. Cleared by the next
    /// observation.
    pub fn idle(&mut self, status: impl Into<String>) {
        self.idle = Some(status.into());
    }

    /// Empties the in-memory set and removes the storage slot.
    pub fn clear(&mut self) -> crate::Result<()> {
        self.tracks = TrackSet::new();
        self.idle = None;
        self.store_warning = None;
        self.store.clear()
    }

    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    pub fn rollup(&self) -> ClassRollup {
        rollup(&self.tracks)
    }

    pub fn idle_status(&self) -> Option<&str> {
        self.idle.as_deref()
    }

    /// The most recent persistence failure, if the last store attempt
    /// did not succeed.
    pub fn store_warning(&self) -> Option<&str> {
        self.store_warning.as_deref()
    }

    fn persist(&mut self) {
        match self.store.store(&self.tracks) {
            Ok(()) => self.store_warning = None,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to persist track set; keeping in-memory state");
                self.store_warning = Some(err.to_string());
            }
        }
    }
}
