use std::sync::Mutex;

use campground_scan::{
    AggregatedSnapshot, AvailabilityLookup, CommandLookup, LookupConfig, TierFilter,
    parse_date, snapshot_from_lookup,
};
use rec_gov::FacilitySearchClient;

use crate::search_types::*;

/// Shared application state for the search endpoints
pub struct SearchState {
    /// Lookup executable
    pub lookup_program: String,
    /// Arguments placed before the search flags
    pub lookup_args: Vec<String>,
    /// RIDB client, absent when no API key is configured
    pub facility_client: Option<FacilitySearchClient>,
    /// Usage counters
    pub stats: Mutex<SearchStats>,
}

impl SearchState {
    /// Creates state with empty statistics
    pub fn new(
        lookup_program: impl Into<String>,
        lookup_args: Vec<String>,
        facility_client: Option<FacilitySearchClient>,
    ) -> Self {
        Self {
            lookup_program: lookup_program.into(),
            lookup_args,
            facility_client,
            stats: Mutex::new(SearchStats::default()),
        }
    }
}

/// Service for running one-shot availability searches
pub struct SearchService<'a> {
    state: &'a SearchState,
}

impl<'a> SearchService<'a> {
    /// Creates a new instance of `SearchService` over the shared state
    pub fn new(state: &'a SearchState) -> Self {
        Self { state }
    }

    /// Builds the lookup configuration for a request
    pub fn lookup_config(&self, request: &SearchRequest) -> Result<LookupConfig, ApiError> {
        let start_date =
            parse_date(&request.start_date).map_err(|e| ApiError::Validation(e.to_string()))?;
        let end_date =
            parse_date(&request.end_date).map_err(|e| ApiError::Validation(e.to_string()))?;

        Ok(LookupConfig {
            program: self.state.lookup_program.clone(),
            program_args: self.state.lookup_args.clone(),
            start_date,
            end_date,
            parks: vec![request.park_id.trim().to_string()],
            nights: request.nights,
            show_campsite_info: true,
        })
    }

    /// Runs one lookup and returns the ranges of the requested tiers
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults, ApiError> {
        let preference = SearchPreference::from_label(request.search_preference.as_deref());
        let lookup = CommandLookup::new(self.lookup_config(request)?)?;

        let availability = lookup.fetch_availability().await?;
        let snapshot = snapshot_from_lookup(&availability, request.nights);
        let results = results_from_snapshot(&snapshot, &preference.tier_filter());

        log::info!(
            "✅ Search for park {} returned {} range(s) ({} priority, {} regular, {} ignored)",
            request.park_id,
            results.len(),
            results.priority.len(),
            results.regular.len(),
            results.ignored.len()
        );

        Ok(results)
    }
}

/// Flattens a snapshot into per-tier result lists, keeping only `filter` tiers
pub fn results_from_snapshot(snapshot: &AggregatedSnapshot, filter: &TierFilter) -> SearchResults {
    let mut results = SearchResults::default();
    for (campground_id, tiers) in snapshot.iter() {
        for tier in filter.iter() {
            let Some(counts) = tiers.get(&tier) else {
                continue;
            };
            for (key, sites) in counts {
                results.tier_mut(tier).push(SearchResultEntry {
                    campground: campground_id.to_string(),
                    range: key.to_string(),
                    sites: *sites,
                    text: format!("{} --> {} site(s) available", key, sites),
                });
            }
        }
    }
    results
}
