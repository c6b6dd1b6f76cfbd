use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::aggregator::{AggregatedSnapshot, snapshot_from_lookup};
use crate::differ::{CampgroundChanges, diff_snapshots};
use crate::scan_types::*;

/// Source of raw availability windows (subprocess, HTTP, fixture...)
#[async_trait::async_trait]
pub trait AvailabilityLookup: Send + Sync {
    /// Fetches the current availability windows of every watched campground
    async fn fetch_availability(&self) -> Result<LookupResult, ScanError>;
}

/// Receives the outcome of every poll
#[async_trait::async_trait]
pub trait AvailabilityReporter: Send + Sync {
    /// Called after each successful poll
    async fn report_poll(&self, report: &PollReport) -> Result<(), ScanError>;

    /// Called when acquisition fails; `retaining_previous` is true when the
    /// loop keeps going with the last good snapshot
    async fn report_failure(
        &self,
        error: &ScanError,
        retaining_previous: bool,
    ) -> Result<(), ScanError>;
}

/// Result of one successful poll
#[derive(Debug, Clone, Serialize)]
pub struct PollReport {
    /// 1-based poll counter, failed polls included
    pub poll_number: u32,
    /// When the lookup returned
    pub checked_at: DateTime<Utc>,
    /// Full classification of this poll
    pub snapshot: AggregatedSnapshot,
    /// Changes against the previous good snapshot, empty on the first one
    pub changes: Vec<CampgroundChanges>,
}

impl PollReport {
    /// Whether any campground changed
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| !c.events.is_empty())
    }
}

/// Poll loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, not started
    Idle,
    /// Acquiring and processing a snapshot
    Polling,
    /// Waiting for the next poll
    Sleeping,
    /// Finished, never restarted
    Terminated,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// One-shot mode finished its single poll
    Completed,
    /// The shutdown signal fired
    Cancelled,
}

/// Counters returned when the loop stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Polls that finished, successful or not
    pub polls: u32,
    /// Polls whose acquisition failed
    pub failures: u32,
    /// Why the loop stopped
    pub termination: Termination,
}

/// Drives acquisition, classification, aggregation and change detection.
///
/// Owns the previous snapshot; it is replaced only after a successful poll,
/// so a failed lookup never looks like everything disappeared.
pub struct ScanExecutor {
    lookup: Arc<dyn AvailabilityLookup>,
    reporter: Arc<dyn AvailabilityReporter>,
    config: ScanConfig,
    state: SchedulerState,
    previous: Option<AggregatedSnapshot>,
    polls: u32,
    failures: u32,
}

impl ScanExecutor {
    /// Creates an idle executor; the configuration is validated here
    pub fn new(
        lookup: Arc<dyn AvailabilityLookup>,
        reporter: Arc<dyn AvailabilityReporter>,
        config: ScanConfig,
    ) -> Result<Self, ScanError> {
        Ok(Self {
            lookup,
            reporter,
            config: config.validated()?,
            state: SchedulerState::Idle,
            previous: None,
            polls: 0,
            failures: 0,
        })
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Last good snapshot, if any poll succeeded
    pub fn previous_snapshot(&self) -> Option<&AggregatedSnapshot> {
        self.previous.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Runs the poll loop until one-shot completion or until `shutdown`
    /// resolves. Both the lookup and the sleep are abandoned on shutdown.
    pub async fn run<F>(&mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.config.is_one_shot() {
            info!("Running one-time check");
        } else {
            info!(
                "Starting availability polling every {} minute(s)",
                self.config.poll_frequency_minutes
            );
        }
        info!("Filtering changes by tiers: {}", self.config.tier_filter);

        let termination = loop {
            match self.state {
                SchedulerState::Idle => self.transition(SchedulerState::Polling),
                SchedulerState::Polling => {
                    let lookup = Arc::clone(&self.lookup);
                    info!("Checking campsite availability (poll #{})", self.polls + 1);

                    let result = tokio::select! {
                        _ = &mut shutdown => break Termination::Cancelled,
                        result = lookup.fetch_availability() => result,
                    };
                    self.process_poll(result).await;

                    match self.config.poll_interval() {
                        None => break Termination::Completed,
                        Some(_) => self.transition(SchedulerState::Sleeping),
                    }
                }
                SchedulerState::Sleeping => {
                    let Some(interval) = self.config.poll_interval() else {
                        break Termination::Completed;
                    };
                    debug!("Sleeping {:?} until next poll", interval);

                    tokio::select! {
                        _ = &mut shutdown => break Termination::Cancelled,
                        _ = sleep(interval) => self.transition(SchedulerState::Polling),
                    }
                }
                SchedulerState::Terminated => break Termination::Completed,
            }
        };

        self.transition(SchedulerState::Terminated);
        if termination == Termination::Cancelled {
            info!("Polling cancelled, exiting");
        }

        RunSummary {
            polls: self.polls,
            failures: self.failures,
            termination,
        }
    }

    /// Turns one acquisition result into a report and rotates the snapshot
    async fn process_poll(&mut self, result: Result<LookupResult, ScanError>) {
        self.polls += 1;

        let lookup = match result {
            Ok(lookup) => lookup,
            Err(e) => {
                self.failures += 1;
                let retaining = !self.config.is_one_shot();
                error!("Availability lookup failed: {}", e);
                if retaining {
                    warn!("Skipping this check, retaining previous results for comparison");
                }
                if let Err(report_error) = self.reporter.report_failure(&e, retaining).await {
                    error!("Failed to report lookup failure: {}", report_error);
                }
                return;
            }
        };

        let snapshot = snapshot_from_lookup(&lookup, self.config.min_nights);
        let changes = match &self.previous {
            Some(previous) => diff_snapshots(previous, &snapshot, &self.config.tier_filter),
            None => Vec::new(),
        };

        let report = PollReport {
            poll_number: self.polls,
            checked_at: Utc::now(),
            snapshot,
            changes,
        };

        if report.has_changes() {
            let total: usize = report.changes.iter().map(|c| c.events.len()).sum();
            info!("Detected {} availability change(s)", total);
        } else {
            debug!("No availability changes detected");
        }

        if let Err(e) = self.reporter.report_poll(&report).await {
            error!("Failed to report poll results: {}", e);
        }

        self.previous = Some(report.snapshot);
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!("Scheduler {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
