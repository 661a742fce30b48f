//! Daily standup windowing.
//!
//! A standup looks back from "now" to a `since` boundary and sorts each
//! repository's events into buckets. Buckets are evaluated independently: a
//! pull request can be "opened" and "merged" in the same window, or only
//! "merged" when it was created before `since`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use crate::event::Event;
use crate::event_kind::EventKind;

/// Standup activity for a single repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStandup {
    pub repo_name: String,
    pub commits: Vec<Event>,
    pub prs_opened: Vec<Event>,
    pub prs_merged: Vec<Event>,
    pub prs_closed: Vec<Event>,
    pub issues_opened: Vec<Event>,
    pub issues_closed: Vec<Event>,
}

impl RepoStandup {
    fn new(repo_name: String) -> Self {
        Self {
            repo_name,
            ..Self::default()
        }
    }

    /// Number of bucket entries across all buckets.
    pub fn total(&self) -> usize {
        self.commits.len()
            + self.prs_opened.len()
            + self.prs_merged.len()
            + self.prs_closed.len()
            + self.issues_opened.len()
            + self.issues_closed.len()
    }
}

/// Computes the start of the standup window.
///
/// A one-day lookback on a Monday reaches back to Friday. Any other lookback
/// is exactly `days` calendar days. The result is midnight in `now`'s timezone.
pub fn compute_standup_since<Tz: TimeZone>(days: u32, now: &DateTime<Tz>) -> DateTime<Tz> {
    let lookback = if days == 1 && now.weekday() == Weekday::Mon {
        3
    } else {
        i64::from(days)
    };
    let shifted = now.clone() - Duration::days(lookback);
    local_midnight(&now.timezone(), shifted.date_naive()).unwrap_or(shifted)
}

/// Midnight of `date` in `tz`. DST ambiguity picks the earlier instant; a
/// spring-forward gap at midnight falls back to 1am.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&date.and_time(midnight))
        .earliest()
        .or_else(|| {
            let one_am = NaiveTime::from_hms_opt(1, 0, 0)?;
            tz.from_local_datetime(&date.and_time(one_am)).earliest()
        })
}

/// Groups events into per-repository standups ordered by repository name.
///
/// Repositories without any qualifying event are omitted.
pub fn build_standup(events: &[Event], since: DateTime<Utc>) -> Vec<RepoStandup> {
    let mut repos: BTreeMap<String, RepoStandup> = BTreeMap::new();
    let after = |timestamp: Option<DateTime<Utc>>| timestamp.is_some_and(|t| t >= since);

    for event in events {
        let repo_name = event.repository.full_name();
        let standup = repos
            .entry(repo_name.clone())
            .or_insert_with(|| RepoStandup::new(repo_name));
        let opened = event.timestamp >= since;

        match event.kind {
            EventKind::Commit => {
                if opened {
                    standup.commits.push(event.clone());
                }
            }
            EventKind::PullRequest => {
                if opened {
                    standup.prs_opened.push(event.clone());
                }
                let details = event.pull_request();
                let merged = details.is_some_and(|pr| pr.merged);
                if merged {
                    if after(details.and_then(|pr| pr.merged_at)) {
                        standup.prs_merged.push(event.clone());
                    }
                } else if after(details.and_then(|pr| pr.closed_at)) {
                    standup.prs_closed.push(event.clone());
                }
            }
            EventKind::Issue => {
                if opened {
                    standup.issues_opened.push(event.clone());
                }
                if after(event.issue().and_then(|issue| issue.closed_at)) {
                    standup.issues_closed.push(event.clone());
                }
            }
            _ => {}
        }
    }

    repos.into_values().filter(|s| s.total() > 0).collect()
}
