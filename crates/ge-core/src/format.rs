//! Human-readable duration strings.
//!
//! Output strings are asserted literally downstream; keep the thresholds stable.

use chrono::{DateTime, Duration, Utc};

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Formats a duration as `"1w 2d"`, `"2d 3h"`, `"3h 30m"`, `"45m"`.
///
/// Seven days or more collapse to weeks. Durations under a minute show as
/// `"1m"`; negative durations show as `"0m"`.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds();
    if total_seconds < 0 {
        return "0m".to_string();
    }

    let days = total_seconds / SECONDS_PER_DAY;
    let hours = (total_seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / 60;

    if days >= 7 {
        let weeks = days / 7;
        let remaining_days = days % 7;
        return if remaining_days > 0 {
            format!("{weeks}w {remaining_days}d")
        } else {
            format!("{weeks}w")
        };
    }
    if days > 0 {
        return if hours > 0 {
            format!("{days}d {hours}h")
        } else {
            format!("{days}d")
        };
    }
    if hours > 0 {
        return if minutes > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h")
        };
    }
    format!("{}m", minutes.max(1))
}

/// Formats the age of something created at `created_at` as `"30m"`, `"2h"`, `"3d"`, `"5w"`.
pub fn age_display(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now - created_at;
    let hours = age.num_hours();

    if hours < 1 {
        return format!("{}m", age.num_minutes().max(1));
    }
    if hours < 24 {
        return format!("{hours}h");
    }
    let days = age.num_days();
    if days < 7 {
        format!("{days}d")
    } else {
        format!("{}w", days / 7)
    }
}
