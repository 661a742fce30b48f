//! Calendar bucketing of event timestamps.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Bucket size for activity timelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    /// Weeks start on Monday.
    Week,
    Month,
}

impl Granularity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Parses a granularity name. Unrecognized names fall back to [`Granularity::Day`].
    pub fn parse_or_default(value: &str) -> Self {
        match value {
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            other => {
                tracing::debug!(granularity = other, "unknown granularity, using day");
                Self::Day
            }
        }
    }

    /// Bucket key for a timestamp. Keys sort lexicographically in chronological order.
    pub fn bucket_key(self, timestamp: DateTime<Utc>) -> String {
        match self {
            Self::Hour => timestamp.format("%Y-%m-%d %H:00").to_string(),
            Self::Day => timestamp.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let days_since_monday = timestamp.weekday().num_days_from_monday();
                let monday = timestamp.date_naive() - Duration::days(i64::from(days_since_monday));
                monday.format("%Y-%m-%d").to_string()
            }
            Self::Month => timestamp.format("%Y-%m").to_string(),
        }
    }
}

impl From<&str> for Granularity {
    fn from(value: &str) -> Self {
        Self::parse_or_default(value)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts events per bucket, keys ascending.
pub fn bucket_counts<'e>(
    events: impl IntoIterator<Item = &'e Event>,
    granularity: Granularity,
) -> BTreeMap<String, usize> {
    let mut timeline = BTreeMap::new();
    for event in events {
        *timeline
            .entry(granularity.bucket_key(event.timestamp))
            .or_insert(0) += 1;
    }
    timeline
}
