//! Per-class aggregate view derived from a track set.

use serde::Serialize;

use crate::track::TrackSet;

/// Summed active time for one class.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClassTotal {
    pub class: String,
    /// Summed active nanoseconds across the class's tracks.
    pub active: u64,
}

/// Derived, ephemeral per-class summary. Recomputed on every display,
/// never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct ClassRollup {
    /// Per-class sums, in first-seen order over the track set.
    pub classes: Vec<ClassTotal>,
    /// Grand total: the sum of every track's active time.
    pub total: u64,
}

/// Single pass over the set, accumulating per-class sums and the grand
/// total. An empty set yields an empty mapping and total 0.
pub fn rollup(tracks: &TrackSet) -> ClassRollup {
    let mut out = ClassRollup::default();
    for track in tracks {
        match out.classes.iter_mut().find(|c| c.class == track.class) {
            Some(entry) => entry.active = entry.active.saturating_add(track.active),
            None => out.classes.push(ClassTotal {
                class: track.class.clone(),
                active: track.active,
            }),
        }
        out.total = out.total.saturating_add(track.active);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;

    fn track(class: &str, name: &str, active: u64) -> Track {
        Track {
            class: class.to_string(),
            name: name.to_string(),
            active,
            seen: "2026-08-01T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn empty_set_yields_empty_rollup() {
        let out = rollup(&TrackSet::new());
        assert!(out.classes.is_empty());
        assert_eq!(out.total, 0);
    }

    #[test]
    fn sums_per_class_and_grand_total() {
        let set = TrackSet::from_tracks(vec![
            track("mem", "y", 10),
            track("cpu", "x", 5),
            track("cpu", "z", 3),
        ]);

        let out = rollup(&set);
        assert_eq!(out.classes.len(), 2);
        assert_eq!(out.classes[0].class, "mem");
        assert_eq!(out.classes[0].active, 10);
        assert_eq!(out.classes[1].class, "cpu");
        assert_eq!(out.classes[1].active, 8);
        assert_eq!(out.total, 18);
    }

    #[test]
    fn classes_appear_in_first_seen_order() {
        // Not alphabetical: order follows the track set.
        let set = TrackSet::from_tracks(vec![
            track("zsh", "a", 1),
            track("alpha", "b", 1),
            track("zsh", "c", 1),
        ]);

        let out = rollup(&set);
        let order: Vec<&str> = out.classes.iter().map(|c| c.class.as_str()).collect();
        assert_eq!(order, vec!["zsh", "alpha"]);
    }

    #[test]
    fn grand_total_equals_sum_of_class_sums() {
        let set = TrackSet::from_tracks(vec![
            track("cpu", "x", 7),
            track("mem", "y", 11),
            track("cpu", "z", 2),
        ]);

        let out = rollup(&set);
        let class_sum: u64 = out.classes.iter().map(|c| c.active).sum();
        let track_sum: u64 = set.iter().map(|t| t.active).sum();
        assert_eq!(out.total, class_sum);
        assert_eq!(out.total, track_sum);
    }
}
