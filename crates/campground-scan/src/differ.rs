use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::aggregator::{AggregatedSnapshot, TierCounts};
use crate::classifier::TierFilter;
use crate::date_range::RangeKey;

/// Direction of an availability change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The range had no sites and now has some
    Appeared,
    /// The range had sites and now has none
    Disappeared,
}

/// A range that became available or unavailable between two polls
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChangeEvent {
    /// Range that changed
    pub range_key: RangeKey,
    /// Direction of the change
    pub kind: ChangeKind,
    /// Sites now available for an appearance, sites lost for a disappearance
    pub site_count: u32,
}

impl ChangeEvent {
    /// A range that became available on `site_count` sites
    pub fn appeared(range_key: RangeKey, site_count: u32) -> Self {
        Self {
            range_key,
            kind: ChangeKind::Appeared,
            site_count,
        }
    }

    /// A range that had `previous_count` sites and now has none
    pub fn disappeared(range_key: RangeKey, previous_count: u32) -> Self {
        Self {
            range_key,
            kind: ChangeKind::Disappeared,
            site_count: previous_count,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::Appeared => write!(
                f,
                "🟢 New availability: {} --> {} site(s) available",
                self.range_key, self.site_count
            ),
            ChangeKind::Disappeared => write!(f, "🔴 No longer available: {}", self.range_key),
        }
    }
}

/// Change events of one campground
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampgroundChanges {
    /// Campground the events belong to
    pub campground_id: String,
    /// Appearances and disappearances
    pub events: Vec<ChangeEvent>,
}

/// Compares two range-to-count maps.
///
/// Only full appearance (0 to n) and disappearance (n to 0) are reported;
/// a count moving between two non-zero values is not a change.
pub fn diff(previous: &TierCounts, current: &TierCounts) -> Vec<ChangeEvent> {
    let keys: BTreeSet<&RangeKey> = previous.keys().chain(current.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let old = previous.get(key).copied().unwrap_or(0);
            let new = current.get(key).copied().unwrap_or(0);
            match (old, new) {
                (0, new) if new > 0 => Some(ChangeEvent::appeared(key.clone(), new)),
                (old, 0) if old > 0 => Some(ChangeEvent::disappeared(key.clone(), old)),
                _ => None,
            }
        })
        .collect()
}

/// Diffs the selected tiers of every campground present in either snapshot.
///
/// Campgrounds without events are left out.
pub fn diff_snapshots(
    previous: &AggregatedSnapshot,
    current: &AggregatedSnapshot,
    filter: &TierFilter,
) -> Vec<CampgroundChanges> {
    let campgrounds: BTreeSet<&str> = previous.campgrounds().chain(current.campgrounds()).collect();

    campgrounds
        .into_iter()
        .filter_map(|campground_id| {
            let events = diff(
                &previous.select(campground_id, filter),
                &current.select(campground_id, filter),
            );
            (!events.is_empty()).then(|| CampgroundChanges {
                campground_id: campground_id.to_string(),
                events,
            })
        })
        .collect()
}
