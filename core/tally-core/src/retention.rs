//! Retention filter: drops tracks not seen within the trailing window.
//!
//! Policy: the filter runs before every merge (and once on load), so a
//! stale track never survives into a freshly stored set. A track whose
//! `seen` string fails to parse is treated as expired and excluded; this
//! localizes damage from a corrupt timestamp to that one entry.

use chrono::{DateTime, Duration, Utc};

use crate::track::TrackSet;

/// Default trailing retention window, in hours.
pub const DEFAULT_WINDOW_HOURS: f64 = 8.0;

/// Parses a track's `seen` field. RFC 3339 with any offset, normalized
/// to UTC.
pub(crate) fn parse_seen(seen: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(seen)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl TrackSet {
    /// Returns the subsequence of tracks whose `seen` is strictly after
    /// `now` minus the window. Pure and order-preserving.
    pub fn prune(&self, window_hours: f64, now: DateTime<Utc>) -> TrackSet {
        let cutoff = now - Duration::milliseconds((window_hours * 3_600_000.0) as i64);
        TrackSet::from_tracks(
            self.iter()
                .filter(|t| matches!(parse_seen(&t.seen), Some(seen) if seen > cutoff))
                .cloned()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;
    use chrono::TimeZone;

    fn track(name: &str, seen: &str) -> Track {
        Track {
            class: "cpu".to_string(),
            name: name.to_string(),
            active: 1,
            seen: seen.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 18, 0, 0).unwrap()
    }

    #[test]
    fn keeps_tracks_inside_window() {
        let set = TrackSet::from_tracks(vec![
            track("fresh", "2026-08-01T17:00:00Z"),
            track("edge", "2026-08-01T10:00:01Z"),
        ]);

        assert_eq!(set.prune(8.0, now()).len(), 2);
    }

    #[test]
    fn drops_tracks_at_or_beyond_cutoff() {
        // Window is strict: seen exactly at now - 8h is stale.
        let set = TrackSet::from_tracks(vec![
            track("boundary", "2026-08-01T10:00:00Z"),
            track("old", "2026-08-01T08:00:00Z"),
        ]);

        assert!(set.prune(8.0, now()).is_empty());
    }

    #[test]
    fn drops_unparsable_seen() {
        let set = TrackSet::from_tracks(vec![
            track("bad", "not-a-timestamp"),
            track("good", "2026-08-01T17:30:00Z"),
        ]);

        let pruned = set.prune(8.0, now());
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned.tracks()[0].name, "good");
    }

    #[test]
    fn preserves_order() {
        let set = TrackSet::from_tracks(vec![
            track("a", "2026-08-01T17:00:00Z"),
            track("b", "2026-08-01T16:00:00Z"),
            track("c", "2026-08-01T17:30:00Z"),
        ]);

        let pruned = set.prune(8.0, now());
        let names: Vec<&str> = pruned.iter().map(|t| t.name.as_str()).collect();
        // Order preserved from input, not re-sorted.
        assert_eq!(
            names,
            set.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn accepts_offset_timestamps() {
        // Same instant as 17:00Z expressed with a +02:00 offset.
        let set = TrackSet::from_tracks(vec![track("offset", "2026-08-01T19:00:00+02:00")]);

        assert_eq!(set.prune(8.0, now()).len(), 1);
    }

    #[test]
    fn does_not_mutate_input() {
        let set = TrackSet::from_tracks(vec![track("old", "2026-08-01T01:00:00Z")]);
        let _ = set.prune(8.0, now());

        assert_eq!(set.len(), 1);
    }
}
