//! Command line notifier: polls campground availability and prints the
//! ranges that open up or sell out between checks.

use std::sync::Arc;

use anyhow::{Context, bail};
use campground_scan::{
    CommandLookup, ConsoleReporter, DEFAULT_LOOKUP_COMMAND, LookupConfig, ScanConfig,
    ScanExecutor, Termination, Tier, TierFilter, parse_date, split_command,
};
use chrono::NaiveDate;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "camping-notify")]
#[command(about = "Watch campgrounds and report availability changes")]
struct Cli {
    /// Start date in YYYY-MM-DD format
    #[arg(long, value_parser = parse_date)]
    start_date: NaiveDate,

    /// End date in YYYY-MM-DD format
    #[arg(long, value_parser = parse_date)]
    end_date: NaiveDate,

    /// Park ids to watch
    #[arg(long, required = true, num_args = 1..)]
    parks: Vec<String>,

    /// Minimum number of nights required
    #[arg(long)]
    nights: u32,

    /// Minutes between checks, 0 for a one-time check
    #[arg(long, default_value_t = 30)]
    frequency: u64,

    /// Tiers whose changes are reported
    #[arg(long, num_args = 1.., default_values_t = Tier::ALL)]
    filters: Vec<Tier>,

    /// Command that prints availability, e.g. "python camping.py"
    #[arg(long, env = "LOOKUP_PROGRAM", default_value = DEFAULT_LOOKUP_COMMAND)]
    lookup_program: String,
}

impl Cli {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            min_nights: self.nights,
            tier_filter: TierFilter::from_tiers(self.filters.iter().copied()),
            poll_frequency_minutes: self.frequency,
        }
    }

    fn lookup_config(&self) -> anyhow::Result<LookupConfig> {
        let (program, program_args) = split_command(&self.lookup_program)?;
        Ok(LookupConfig {
            program,
            program_args,
            start_date: self.start_date,
            end_date: self.end_date,
            parks: self.parks.clone(),
            nights: self.nights,
            show_campsite_info: true,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let lookup = CommandLookup::new(cli.lookup_config()?).context("Invalid lookup settings")?;
    let mut executor = ScanExecutor::new(
        Arc::new(lookup),
        Arc::new(ConsoleReporter),
        cli.scan_config(),
    )
    .context("Invalid scan settings")?;

    let summary = executor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    log::info!(
        "Stopped after {} check(s), {} failed",
        summary.polls,
        summary.failures
    );

    if summary.termination == Termination::Completed && summary.failures > 0 {
        bail!("Availability check failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from([
            "camping-notify",
            "--start-date",
            "2024-07-01",
            "--end-date",
            "2024-07-31",
            "--parks",
            "232447",
            "232449",
            "--nights",
            "2",
            "--lookup-program",
            "python camping.py",
        ])
        .unwrap();

        assert_eq!(cli.parks, vec!["232447", "232449"]);
        assert_eq!(cli.frequency, 30);
        assert_eq!(cli.scan_config().tier_filter, TierFilter::all());

        let lookup = cli.lookup_config().unwrap();
        assert_eq!(lookup.program, "python");
        assert_eq!(lookup.program_args, vec!["camping.py"]);
        assert!(lookup.show_campsite_info);
    }

    #[test]
    fn test_filters_and_one_shot() {
        let cli = Cli::try_parse_from([
            "camping-notify",
            "--start-date",
            "2024-07-01",
            "--end-date",
            "2024-07-31",
            "--parks",
            "232447",
            "--nights",
            "1",
            "--frequency",
            "0",
            "--filters",
            "priority",
            "regular",
        ])
        .unwrap();

        let config = cli.scan_config();
        assert!(config.is_one_shot());
        assert!(config.tier_filter.contains(Tier::Regular));
        assert!(!config.tier_filter.contains(Tier::Ignored));
    }

    #[test]
    fn test_rejects_bad_input() {
        let bad_date = Cli::try_parse_from([
            "camping-notify",
            "--start-date",
            "07/01/2024",
            "--end-date",
            "2024-07-31",
            "--parks",
            "232447",
            "--nights",
            "1",
        ]);
        assert!(bad_date.is_err());

        let bad_tier = Cli::try_parse_from([
            "camping-notify",
            "--start-date",
            "2024-07-01",
            "--end-date",
            "2024-07-31",
            "--parks",
            "232447",
            "--nights",
            "1",
            "--filters",
            "weekdays",
        ]);
        assert!(bad_tier.is_err());
    }
}
