use std::borrow::Cow;

use regex::Regex;
use tracing::warn;

use crate::date_range::DateRange;
use crate::scan_types::{ParseError, SiteAvailability};

lazy_static::lazy_static! {
    static ref ANSI_ESCAPE: Regex =
        Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").unwrap();
}

const CAMPGROUND_MARKER: &str = "🏕";
const SITE_PREFIX: &str = "* Site";
const WINDOW_PREFIX: &str = "* ";

/// Records recovered from lookup output, plus the lines that were skipped
#[derive(Debug, Default)]
pub struct ParsedLookup {
    /// Campground names in header order, with or without windows
    pub campgrounds: Vec<String>,
    /// Well-formed availability windows in output order
    pub records: Vec<SiteAvailability>,
    /// One error per skipped window line
    pub skipped: Vec<ParseError>,
}

/// Removes terminal colour and style escape sequences
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// Parses the text printed by the availability lookup program.
///
/// The grammar is line based:
///
/// ```text
/// 🏕 UPPER PINES (232447): 3 site(s) available out of 238 site(s)
///   * Site 042 is available on the following dates:
///     * 2024-07-05 -> 2024-07-07
/// ```
///
/// Lines outside this grammar are ignored. Window lines that cannot be
/// attributed to a site, or whose dates are invalid, are skipped and
/// reported in [`ParsedLookup::skipped`].
pub fn parse_lookup_output(output: &str) -> ParsedLookup {
    let mut parsed = ParsedLookup::default();
    let mut campground: Option<String> = None;
    let mut site: Option<String> = None;

    for (index, raw_line) in output.lines().enumerate() {
        let line_number = index + 1;
        let cleaned = strip_ansi(raw_line);
        let line = cleaned.trim();

        if let Some(header) = line.strip_prefix(CAMPGROUND_MARKER) {
            let name = campground_name(header);
            campground = (!name.is_empty()).then(|| name.to_string());
            site = None;
            if let Some(name) = &campground {
                if !parsed.campgrounds.contains(name) {
                    parsed.campgrounds.push(name.clone());
                }
            } else {
                parsed.skip(ParseError::MalformedRecord {
                    line: line_number,
                    reason: "campground header without a name".to_string(),
                });
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix(SITE_PREFIX) {
            site = rest.split_whitespace().next().map(str::to_string);
            if site.is_none() {
                parsed.skip(ParseError::MalformedRecord {
                    line: line_number,
                    reason: "site line without an id".to_string(),
                });
            }
            continue;
        }

        let Some(window) = line
            .strip_prefix(WINDOW_PREFIX)
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        else {
            continue;
        };

        let (Some(campground_id), Some(site_id)) = (&campground, &site) else {
            parsed.skip(ParseError::MalformedRecord {
                line: line_number,
                reason: format!("date range '{}' outside a campground site", window),
            });
            continue;
        };

        match window.parse::<DateRange>() {
            Ok(range) => parsed
                .records
                .push(SiteAvailability::new(campground_id, site_id, range)),
            Err(e) => parsed.skip(ParseError::MalformedRecord {
                line: line_number,
                reason: e.to_string(),
            }),
        }
    }

    parsed
}

impl ParsedLookup {
    fn skip(&mut self, error: ParseError) {
        warn!("Skipping lookup output: {}", error);
        self.skipped.push(error);
    }
}

// "UPPER PINES (232447): 3 site(s) ..." -> "UPPER PINES"
fn campground_name(header: &str) -> &str {
    // Tolerate the emoji presentation selector after the marker.
    let header = header.trim_start_matches('\u{FE0F}');
    let before_colon = header.split(':').next().unwrap_or_default();
    before_colon
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
}
