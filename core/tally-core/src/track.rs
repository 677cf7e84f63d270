//! Track model and the merge operation.
//!
//! A [`Track`] accumulates active time for one (class, name) pair. A
//! [`TrackSet`] holds at most one track per pair, ordered for display
//! (most active first). The only mutations are [`TrackSet::merge`] and
//! the retention filter in [`crate::retention`].

use serde::{Deserialize, Serialize};

/// Accumulated active-duration record for one (class, name) pair.
///
/// Wire and slot JSON keep the legacy PascalCase keys
/// (`{"Class", "Name", "Active", "Seen"}`). `#[serde(default)]` gives
/// forward compatibility; entries that deserialize with an empty class or
/// name are dropped on load as malformed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Track {
    /// Category identifier, non-empty.
    pub class: String,
    /// Entity identifier within the class, non-empty.
    pub name: String,
    /// Cumulative active duration in nanoseconds.
    pub active: u64,
    /// Last observation time as an RFC 3339 string. Kept unparsed so
    /// that one malformed timestamp expires one track at prune time
    /// instead of invalidating the whole persisted set.
    pub seen: String,
}

impl Track {
    /// True when the identity fields carry usable values.
    pub fn is_valid(&self) -> bool {
        !self.class.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// One incremental activity report from the event stream.
///
/// Same shape as [`Track`], but `active` is an increment to apply, not a
/// running total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Observation {
    pub class: String,
    pub name: String,
    /// Active duration increment in nanoseconds.
    pub active: u64,
    /// Observation time as an RFC 3339 string.
    pub seen: String,
}

impl From<Observation> for Track {
    fn from(obs: Observation) -> Self {
        Track {
            class: obs.class,
            name: obs.name,
            active: obs.active,
            seen: obs.seen,
        }
    }
}

/// The deduplicated, display-ordered collection of all current tracks.
///
/// Serializes transparently as a JSON array, matching the storage slot
/// format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct TrackSet(Vec<Track>);

impl TrackSet {
    pub fn new() -> Self {
        TrackSet(Vec::new())
    }

    /// Wraps an existing list without re-sorting; callers that bypass
    /// [`merge`](Self::merge) are responsible for order.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        TrackSet(tracks)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds one observation into the set.
    ///
    /// An existing (class, name) entry accumulates `active` (saturating,
    /// no wraparound) and takes the incoming `seen` unconditionally; last
    /// write wins even if the incoming timestamp is earlier. A new pair
    /// is appended with the increment as its initial total. The set is
    /// then re-sorted by `active` descending; the sort is stable, so ties
    /// keep their prior relative order.
    pub fn merge(&mut self, obs: &Observation) {
        match self
            .0
            .iter_mut()
            .find(|t| t.class == obs.class && t.name == obs.name)
        {
            Some(track) => {
                track.active = track.active.saturating_add(obs.active);
                track.seen = obs.seen.clone();
            }
            None => self.0.push(Track::from(obs.clone())),
        }
        self.0.sort_by(|a, b| b.active.cmp(&a.active));
    }

    /// Drops entries whose identity fields are empty. Applied after
    /// loading persisted state, where partial records can appear via
    /// `#[serde(default)]`.
    pub fn retain_valid(&mut self) {
        self.0.retain(Track::is_valid);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
