use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::scan_types::ParseError;

/// Desirability bucket of a stay window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Weekend-anchored stays
    Priority,
    /// Acceptable stays touching the weekend
    Regular,
    /// Everything else long enough to qualify
    Ignored,
}

impl Tier {
    /// All tiers in display order
    pub const ALL: [Tier; 3] = [Tier::Priority, Tier::Regular, Tier::Ignored];

    /// Lowercase name used in configuration and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Priority => "priority",
            Tier::Regular => "regular",
            Tier::Ignored => "ignored",
        }
    }

    /// Section heading used in text reports
    pub fn heading(&self) -> &'static str {
        match self {
            Tier::Priority => "Priority",
            Tier::Regular => "Regular",
            Tier::Ignored => "Ignored",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(Tier::Priority),
            "regular" => Ok(Tier::Regular),
            "ignored" => Ok(Tier::Ignored),
            other => Err(ParseError::UnknownTier(other.to_string())),
        }
    }
}

/// Set of tiers selected for change detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierFilter(BTreeSet<Tier>);

impl TierFilter {
    /// Selects every tier
    pub fn all() -> Self {
        Self::from_tiers(Tier::ALL)
    }

    /// Selects the given tiers
    pub fn from_tiers(tiers: impl IntoIterator<Item = Tier>) -> Self {
        Self(tiers.into_iter().collect())
    }

    /// Whether `tier` is selected
    pub fn contains(&self, tier: Tier) -> bool {
        self.0.contains(&tier)
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected tiers in Priority, Regular, Ignored order
    pub fn iter(&self) -> impl Iterator<Item = Tier> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for TierFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|tier| tier.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Predicate over (check-in weekday, check-out weekday)
pub type WeekdayPredicate = fn(Weekday, Weekday) -> bool;

/// One row of the classification table
#[derive(Debug, Clone, Copy)]
pub struct StayRule {
    /// Matches Priority stays
    pub priority: WeekdayPredicate,
    /// Matches Regular stays, if the row has a Regular tier at all
    pub regular: Option<WeekdayPredicate>,
}

impl StayRule {
    /// Priority is checked first, then Regular, otherwise Ignored
    pub fn tier_for(&self, start: Weekday, end: Weekday) -> Tier {
        if (self.priority)(start, end) {
            Tier::Priority
        } else if self.regular.is_some_and(|regular| regular(start, end)) {
            Tier::Regular
        } else {
            Tier::Ignored
        }
    }
}

// Rows for min_nights 1 through 4.
static STAY_RULES: [StayRule; 4] = [
    StayRule {
        priority: |start, _| matches!(start, Weekday::Fri | Weekday::Sat),
        regular: Some(|start, _| matches!(start, Weekday::Thu | Weekday::Sun)),
    },
    StayRule {
        // Friday check-in always includes the Saturday night.
        priority: |start, _| start == Weekday::Fri,
        regular: Some(|start, end| {
            matches!(
                start,
                Weekday::Thu | Weekday::Fri | Weekday::Sat | Weekday::Sun
            ) && matches!(end, Weekday::Sat | Weekday::Sun | Weekday::Mon)
        }),
    },
    StayRule {
        priority: |start, _| matches!(start, Weekday::Thu | Weekday::Fri),
        regular: None,
    },
    StayRule {
        priority: |start, _| start == Weekday::Thu,
        regular: None,
    },
];

// Five nights or more always cover a weekend.
static EXTENDED_STAY: StayRule = StayRule {
    priority: |_, _| true,
    regular: None,
};

/// Looks up the classification row for a minimum-nights requirement
pub fn rule_for(min_nights: u32) -> &'static StayRule {
    match min_nights {
        1..=4 => &STAY_RULES[(min_nights - 1) as usize],
        _ => &EXTENDED_STAY,
    }
}

/// Assigns a tier to a stay from its weekdays.
///
/// Does not check the length of the stay; callers drop windows shorter
/// than `min_nights` before classifying (see [`classify_stay`]).
pub fn classify(start_date: NaiveDate, end_date: NaiveDate, min_nights: u32) -> Tier {
    rule_for(min_nights).tier_for(start_date.weekday(), end_date.weekday())
}

/// Classifies a window, or `None` when it is shorter than `min_nights`
pub fn classify_stay(range: &DateRange, min_nights: u32) -> Option<Tier> {
    if range.nights() < i64::from(min_nights) {
        return None;
    }
    Some(classify(range.start(), range.end(), min_nights))
}
