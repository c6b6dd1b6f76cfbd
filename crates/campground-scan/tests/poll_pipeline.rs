//! Drives the poll loop end to end with a scripted lookup.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use campground_scan::*;
use tokio::time::{Instant, sleep};

const WEEKEND: &str = "2024-07-05 (Fri) -> 2024-07-07 (Sun)";

struct ScriptedLookup {
    responses: Mutex<VecDeque<Result<Vec<SiteAvailability>, ScanError>>>,
    calls: AtomicU32,
}

impl ScriptedLookup {
    fn new(responses: Vec<Result<Vec<SiteAvailability>, ScanError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AvailabilityLookup for ScriptedLookup {
    async fn fetch_availability(&self) -> Result<LookupResult, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => response.map(LookupResult::from),
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
struct RecordingReporter {
    polls: Mutex<Vec<PollReport>>,
    failures: Mutex<Vec<(String, bool)>>,
}

impl RecordingReporter {
    fn polls(&self) -> Vec<PollReport> {
        self.polls.lock().unwrap().clone()
    }

    fn failures(&self) -> Vec<(String, bool)> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AvailabilityReporter for RecordingReporter {
    async fn report_poll(&self, report: &PollReport) -> Result<(), ScanError> {
        self.polls.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn report_failure(
        &self,
        error: &ScanError,
        retaining_previous: bool,
    ) -> Result<(), ScanError> {
        self.failures
            .lock()
            .unwrap()
            .push((error.to_string(), retaining_previous));
        Ok(())
    }
}

fn site(campground: &str, site: &str, start: &str, end: &str) -> SiteAvailability {
    SiteAvailability::new(campground, site, DateRange::parse(start, end).unwrap())
}

fn weekend_site(id: &str) -> SiteAvailability {
    site("X", id, "2024-07-05", "2024-07-07")
}

fn config(frequency: u64, tiers: &[Tier]) -> ScanConfig {
    ScanConfig {
        min_nights: 2,
        tier_filter: TierFilter::from_tiers(tiers.iter().copied()),
        poll_frequency_minutes: frequency,
    }
}

fn scan_executor(
    lookup: &Arc<ScriptedLookup>,
    reporter: &Arc<RecordingReporter>,
    config: ScanConfig,
) -> ScanExecutor {
    ScanExecutor::new(lookup.clone(), reporter.clone(), config).unwrap()
}

fn all_events(report: &PollReport) -> Vec<ChangeEvent> {
    report
        .changes
        .iter()
        .flat_map(|c| c.events.iter().cloned())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn count_change_between_polls_is_silent() {
    let lookup = ScriptedLookup::new(vec![
        Ok(vec![weekend_site("1"), weekend_site("2")]),
        Ok(vec![weekend_site("1")]),
    ]);
    let reporter = Arc::new(RecordingReporter::default());
    let mut executor = scan_executor(&lookup, &reporter, config(30, &[Tier::Priority]));

    let summary = executor.run(sleep(Duration::from_secs(45 * 60))).await;

    assert_eq!(summary.termination, Termination::Cancelled);
    let polls = reporter.polls();
    assert_eq!(polls.len(), 2);

    assert_eq!(polls[0].snapshot.count("X", Tier::Priority, WEEKEND), 2);
    assert_eq!(polls[0].snapshot.campground("X").unwrap().len(), 1);
    assert!(polls[0].changes.is_empty());

    assert_eq!(polls[1].snapshot.count("X", Tier::Priority, WEEKEND), 1);
    assert!(polls[1].changes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn appearance_and_disappearance_are_reported() {
    let midweek = site("X", "3", "2024-07-02", "2024-07-04");
    let lookup = ScriptedLookup::new(vec![
        Ok(vec![midweek.clone()]),
        Ok(vec![midweek.clone(), weekend_site("1")]),
        Ok(vec![midweek]),
    ]);
    let reporter = Arc::new(RecordingReporter::default());
    let mut executor = scan_executor(
        &lookup,
        &reporter,
        config(30, &[Tier::Priority, Tier::Regular]),
    );

    executor.run(sleep(Duration::from_secs(75 * 60))).await;

    let polls = reporter.polls();
    assert_eq!(polls.len(), 3);

    let weekend_key = RangeKey::from_dates("2024-07-05", "2024-07-07").unwrap();
    assert_eq!(
        all_events(&polls[1]),
        vec![ChangeEvent::appeared(weekend_key.clone(), 1)]
    );
    assert_eq!(
        all_events(&polls[2]),
        vec![ChangeEvent::disappeared(weekend_key, 1)]
    );
    // The midweek range is Ignored and never selected.
    assert!(polls.iter().all(|p| all_events(p)
        .iter()
        .all(|e| e.range_key.as_str() != "2024-07-02 (Tue) -> 2024-07-04 (Thu)")));
}

#[tokio::test(start_paused = true)]
async fn failed_poll_retains_last_good_snapshot() {
    let lookup = ScriptedLookup::new(vec![
        Ok(vec![weekend_site("1")]),
        Err(ScanError::Acquisition("network unreachable".to_string())),
        Ok(vec![weekend_site("1")]),
        Ok(vec![]),
    ]);
    let reporter = Arc::new(RecordingReporter::default());
    let mut executor = scan_executor(&lookup, &reporter, config(30, &[Tier::Priority]));

    let summary = executor.run(sleep(Duration::from_secs(100 * 60))).await;

    assert_eq!(lookup.calls(), 4);
    assert_eq!(summary.polls, 4);
    assert_eq!(summary.failures, 1);

    let failures = reporter.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.contains("network unreachable"));
    assert!(failures[0].1);

    let polls = reporter.polls();
    assert_eq!(polls.len(), 3);
    assert_eq!(polls[1].poll_number, 3);
    assert!(polls[1].changes.is_empty());
    assert_eq!(all_events(&polls[2]).len(), 1);
    assert_eq!(all_events(&polls[2])[0].kind, ChangeKind::Disappeared);
}

#[tokio::test(start_paused = true)]
async fn one_shot_polls_once_without_sleeping() {
    let lookup = ScriptedLookup::new(vec![Ok(vec![weekend_site("1")]), Ok(vec![])]);
    let reporter = Arc::new(RecordingReporter::default());
    let mut executor = scan_executor(&lookup, &reporter, config(0, &[Tier::Priority]));

    let started = Instant::now();
    let summary = executor.run(std::future::pending()).await;

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(lookup.calls(), 1);
    assert_eq!(summary.polls, 1);
    assert_eq!(summary.termination, Termination::Completed);
    assert_eq!(executor.state(), SchedulerState::Terminated);
    assert_eq!(reporter.polls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn one_shot_failure_terminates_after_reporting() {
    let lookup = ScriptedLookup::new(vec![Err(ScanError::Acquisition("boom".to_string()))]);
    let reporter = Arc::new(RecordingReporter::default());
    let mut executor = scan_executor(&lookup, &reporter, config(0, &[Tier::Priority]));

    let started = Instant::now();
    let summary = executor.run(std::future::pending()).await;

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(lookup.calls(), 1);
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.termination, Termination::Completed);
    assert_eq!(reporter.failures(), vec![("Acquisition error: boom".to_string(), false)]);
    assert!(reporter.polls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_sleep_ends_loop() {
    let lookup = ScriptedLookup::new(vec![Ok(vec![weekend_site("1")]), Ok(vec![])]);
    let reporter = Arc::new(RecordingReporter::default());
    let mut executor = scan_executor(&lookup, &reporter, config(60, &[Tier::Priority]));

    let summary = executor.run(sleep(Duration::from_secs(10 * 60))).await;

    assert_eq!(summary.termination, Termination::Cancelled);
    assert_eq!(lookup.calls(), 1);
    assert_eq!(executor.state(), SchedulerState::Terminated);
    assert_eq!(
        executor
            .previous_snapshot()
            .unwrap()
            .count("X", Tier::Priority, WEEKEND),
        1
    );
}

struct FixedLookup(LookupResult);

#[async_trait::async_trait]
impl AvailabilityLookup for FixedLookup {
    async fn fetch_availability(&self) -> Result<LookupResult, ScanError> {
        Ok(self.0.clone())
    }
}

#[tokio::test(start_paused = true)]
async fn campground_without_windows_is_still_reported() {
    let lookup = Arc::new(FixedLookup(LookupResult {
        campgrounds: vec!["X".to_string(), "TUOLUMNE MEADOWS".to_string()],
        records: vec![weekend_site("1")],
    }));
    let reporter = Arc::new(RecordingReporter::default());
    let mut executor =
        ScanExecutor::new(lookup, reporter.clone(), config(0, &[Tier::Priority])).unwrap();

    executor.run(std::future::pending()).await;

    let polls = reporter.polls();
    assert_eq!(polls.len(), 1);
    let snapshot = &polls[0].snapshot;
    assert!(snapshot.campground("TUOLUMNE MEADOWS").unwrap().is_empty());
    assert_eq!(snapshot.count("X", Tier::Priority, WEEKEND), 1);

    let text = render_report(&polls[0]);
    assert!(text.contains("🏕 TUOLUMNE MEADOWS\n  **Priority Results:**"));
}
