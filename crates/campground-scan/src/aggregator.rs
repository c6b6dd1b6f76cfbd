use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::classifier::{Tier, TierFilter, classify_stay};
use crate::date_range::RangeKey;
use crate::scan_types::{LookupResult, SiteAvailability};

/// Number of sites offering each range
pub type TierCounts = BTreeMap<RangeKey, u32>;

/// Per-tier counts for one campground
pub type CampgroundTiers = BTreeMap<Tier, TierCounts>;

/// Classification and aggregation result of one poll.
///
/// Maps campground id to tier to range key to site count. Every count is
/// at least 1; tiers with no ranges are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregatedSnapshot {
    campgrounds: BTreeMap<String, CampgroundTiers>,
}

impl AggregatedSnapshot {
    /// Creates an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a campground even if none of its ranges qualify
    pub fn ensure_campground(&mut self, campground_id: &str) {
        if !self.campgrounds.contains_key(campground_id) {
            self.campgrounds
                .insert(campground_id.to_string(), CampgroundTiers::new());
        }
    }

    /// Counts one site observation for a range
    pub fn record(&mut self, campground_id: &str, tier: Tier, key: RangeKey) {
        self.ensure_campground(campground_id);
        if let Some(tiers) = self.campgrounds.get_mut(campground_id) {
            *tiers.entry(tier).or_default().entry(key).or_insert(0) += 1;
        }
    }

    /// Campground ids in sorted order
    pub fn campgrounds(&self) -> impl Iterator<Item = &str> {
        self.campgrounds.keys().map(String::as_str)
    }

    /// All tiers of one campground
    pub fn campground(&self, campground_id: &str) -> Option<&CampgroundTiers> {
        self.campgrounds.get(campground_id)
    }

    /// Counts of one tier of one campground
    pub fn tier(&self, campground_id: &str, tier: Tier) -> Option<&TierCounts> {
        self.campgrounds.get(campground_id)?.get(&tier)
    }

    /// Site count for a range, 0 when absent
    pub fn count(&self, campground_id: &str, tier: Tier, key: &str) -> u32 {
        self.tier(campground_id, tier)
            .and_then(|counts| counts.get(key))
            .copied()
            .unwrap_or(0)
    }

    /// Union of the selected tiers of one campground.
    ///
    /// On a key present in several selected tiers the later tier wins;
    /// classification never puts one range in two tiers.
    pub fn select(&self, campground_id: &str, filter: &TierFilter) -> TierCounts {
        let mut selected = TierCounts::new();
        if let Some(tiers) = self.campgrounds.get(campground_id) {
            for tier in filter.iter() {
                if let Some(counts) = tiers.get(&tier) {
                    selected.extend(counts.iter().map(|(key, count)| (key.clone(), *count)));
                }
            }
        }
        selected
    }

    /// Whether no campground was seen
    pub fn is_empty(&self) -> bool {
        self.campgrounds.is_empty()
    }

    /// Iterates campgrounds with their tiers
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CampgroundTiers)> {
        self.campgrounds
            .iter()
            .map(|(id, tiers)| (id.as_str(), tiers))
    }
}

/// Builds a snapshot from classified `(campground, tier, key)` triples
pub fn aggregate<I>(classified: I) -> AggregatedSnapshot
where
    I: IntoIterator<Item = (String, Tier, RangeKey)>,
{
    let mut snapshot = AggregatedSnapshot::new();
    for (campground_id, tier, key) in classified {
        snapshot.record(&campground_id, tier, key);
    }
    snapshot
}

/// Aggregates a lookup result, registering every campground it named
pub fn snapshot_from_lookup(result: &LookupResult, min_nights: u32) -> AggregatedSnapshot {
    let mut snapshot = build_snapshot(&result.records, min_nights);
    for campground_id in &result.campgrounds {
        snapshot.ensure_campground(campground_id);
    }
    snapshot
}

/// Classifies raw availability records and aggregates them.
///
/// Windows shorter than `min_nights` are dropped, but their campground
/// still appears in the snapshot.
pub fn build_snapshot(records: &[SiteAvailability], min_nights: u32) -> AggregatedSnapshot {
    let mut snapshot = AggregatedSnapshot::new();
    let mut dropped = 0usize;

    for record in records {
        snapshot.ensure_campground(&record.campground_id);
        match classify_stay(&record.range, min_nights) {
            Some(tier) => snapshot.record(&record.campground_id, tier, record.range.key()),
            None => dropped += 1,
        }
    }

    debug!(
        "Aggregated {} records into {} campgrounds ({} shorter than {} nights dropped)",
        records.len(),
        snapshot.campgrounds.len(),
        dropped,
        min_nights
    );

    snapshot
}
