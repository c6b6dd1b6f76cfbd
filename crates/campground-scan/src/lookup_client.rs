use chrono::NaiveDate;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::executor::AvailabilityLookup;
use crate::output_parser::parse_lookup_output;
use crate::scan_types::{LookupResult, ScanError};

/// Lookup command used when none is configured
pub const DEFAULT_LOOKUP_COMMAND: &str = "python camping.py";

/// Splits a command line such as `python camping.py` into program and arguments
pub fn split_command(command: &str) -> Result<(String, Vec<String>), ScanError> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| ScanError::ConfigError("Lookup command must not be empty".to_string()))?;
    Ok((program, parts.collect()))
}

/// How to invoke the external availability lookup program
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Executable to run, e.g. `python`
    pub program: String,
    /// Arguments placed before the search flags, e.g. `["camping.py"]`
    pub program_args: Vec<String>,
    /// First date of the search window
    pub start_date: NaiveDate,
    /// Last date of the search window
    pub end_date: NaiveDate,
    /// Park (campground) ids to search
    pub parks: Vec<String>,
    /// Minimum nights passed through to the lookup
    pub nights: u32,
    /// Ask the lookup to list individual sites and their windows
    pub show_campsite_info: bool,
}

impl LookupConfig {
    /// Full argument list for the lookup process
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.program_args.clone();
        args.push("--start-date".to_string());
        args.push(self.start_date.format("%Y-%m-%d").to_string());
        args.push("--end-date".to_string());
        args.push(self.end_date.format("%Y-%m-%d").to_string());
        args.push("--parks".to_string());
        args.extend(self.parks.iter().cloned());
        args.push("--nights".to_string());
        args.push(self.nights.to_string());
        if self.show_campsite_info {
            args.push("--show-campsite-info".to_string());
        }
        args
    }
}

/// Runs the lookup program as a subprocess and parses its output.
///
/// The child is killed if the fetch is abandoned, so cancelling the poll
/// loop does not leave a lookup running.
pub struct CommandLookup {
    config: LookupConfig,
}

impl CommandLookup {
    /// Create a new command lookup
    pub fn new(config: LookupConfig) -> Result<Self, ScanError> {
        if config.program.trim().is_empty() {
            return Err(ScanError::ConfigError(
                "Lookup program must not be empty".to_string(),
            ));
        }
        if config.parks.is_empty() {
            return Err(ScanError::Validation(
                "At least one park id is required".to_string(),
            ));
        }
        if config.end_date <= config.start_date {
            return Err(ScanError::Validation(
                "End date must be after start date".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Lookup configuration
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl AvailabilityLookup for CommandLookup {
    async fn fetch_availability(&self) -> Result<LookupResult, ScanError> {
        let args = self.config.command_args();
        debug!("Running {} {}", self.config.program, args.join(" "));

        let output = Command::new(&self.config.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ScanError::Acquisition(format!("Failed to run {}: {}", self.config.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Acquisition(format!(
                "{} exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_lookup_output(&stdout);
        if !parsed.skipped.is_empty() {
            warn!(
                "Skipped {} malformed line(s) in lookup output",
                parsed.skipped.len()
            );
        }
        debug!(
            "Lookup returned {} availability window(s) across {} campground(s)",
            parsed.records.len(),
            parsed.campgrounds.len()
        );

        Ok(LookupResult {
            campgrounds: parsed.campgrounds,
            records: parsed.records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(program: &str, program_args: &[&str]) -> LookupConfig {
        LookupConfig {
            program: program.to_string(),
            program_args: program_args.iter().map(|a| a.to_string()).collect(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
            parks: vec!["232447".to_string(), "232449".to_string()],
            nights: 2,
            show_campsite_info: true,
        }
    }

    #[test]
    fn test_split_command() {
        let (program, args) = split_command("  python  camping.py ").unwrap();
        assert_eq!(program, "python");
        assert_eq!(args, vec!["camping.py"]);

        assert!(matches!(split_command("   "), Err(ScanError::ConfigError(_))));
    }

    #[test]
    fn test_command_args() {
        let args = config("python", &["camping.py"]).command_args();
        assert_eq!(
            args,
            vec![
                "camping.py",
                "--start-date",
                "2024-07-01",
                "--end-date",
                "2024-07-31",
                "--parks",
                "232447",
                "232449",
                "--nights",
                "2",
                "--show-campsite-info",
            ]
        );
    }

    #[test]
    fn test_rejects_bad_config() {
        let mut no_parks = config("python", &[]);
        no_parks.parks.clear();
        assert!(matches!(
            CommandLookup::new(no_parks),
            Err(ScanError::Validation(_))
        ));

        let mut inverted = config("python", &[]);
        inverted.end_date = inverted.start_date;
        assert!(matches!(
            CommandLookup::new(inverted),
            Err(ScanError::Validation(_))
        ));

        assert!(matches!(
            CommandLookup::new(config(" ", &[])),
            Err(ScanError::ConfigError(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parses_program_output() {
        let script = "printf '%s\\n' '🏕 UPPER PINES (232447): 1 site(s)' '* Site 42 is available' '* 2024-07-05 -> 2024-07-07'";
        let lookup = CommandLookup::new(config("sh", &["-c", script])).unwrap();

        let result = lookup.fetch_availability().await.unwrap();
        assert_eq!(result.campgrounds, vec!["UPPER PINES".to_string()]);
        let records = result.records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].campground_id, "UPPER PINES");
        assert_eq!(records[0].site_id, "42");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_acquisition_error() {
        let lookup =
            CommandLookup::new(config("sh", &["-c", "echo 'rate limited' >&2; exit 3"])).unwrap();

        let err = lookup.fetch_availability().await.unwrap_err();
        match err {
            ScanError::Acquisition(message) => assert!(message.contains("rate limited")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_acquisition_error() {
        let lookup = CommandLookup::new(config("definitely-not-a-lookup-program", &[])).unwrap();
        assert!(matches!(
            lookup.fetch_availability().await,
            Err(ScanError::Acquisition(_))
        ));
    }
}
