//! Activity aggregation across multiple repositories.
//!
//! An [`Aggregator`] owns an append-only, insertion-ordered buffer of events.
//! It is a single-writer structure: scope one instance per logical request
//! rather than sharing it between concurrent callers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::event::Event;
use crate::event_kind::EventKind;
use crate::filter::EventFilter;
use crate::rank::top_n;
use crate::repository::{Contributor, Repository};
use crate::timeline::{Granularity, bucket_counts};

/// Result of aggregating a filtered set of events.
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    /// Matching events, newest first. Equal timestamps keep insertion order.
    pub events: Vec<Event>,
    pub total_count: usize,
    /// Counts keyed by `owner/name`.
    pub by_repository: BTreeMap<String, usize>,
    /// Counts keyed by username.
    pub by_contributor: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<EventKind, usize>,
    /// Earliest and latest canonical timestamps; both `None` when empty.
    pub date_range: (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
}

/// Rollup for a single contributor.
#[derive(Debug, Clone)]
pub struct ContributorStats {
    pub contributor: Contributor,
    pub total: usize,
    pub by_kind: BTreeMap<EventKind, usize>,
    pub by_repository: BTreeMap<String, usize>,
    pub first_activity: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Rollup for a single repository.
#[derive(Debug, Clone)]
pub struct RepositoryStats {
    pub repository: Repository,
    pub total: usize,
    pub by_kind: BTreeMap<EventKind, usize>,
    pub contributors: BTreeSet<String>,
    pub first_activity: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl RepositoryStats {
    /// Number of distinct contributor usernames.
    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }
}

/// Tracks the min/max of a stream of timestamps.
#[derive(Debug, Clone, Copy, Default)]
struct Span {
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
}

impl Span {
    fn observe(&mut self, timestamp: DateTime<Utc>) {
        if self.first.is_none_or(|first| timestamp < first) {
            self.first = Some(timestamp);
        }
        if self.last.is_none_or(|last| timestamp > last) {
            self.last = Some(timestamp);
        }
    }
}

/// Accumulates events and answers aggregate queries over them.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    events: Vec<Event>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends events, preserving their order.
    pub fn add_events(&mut self, events: impl IntoIterator<Item = Event>) {
        let before = self.events.len();
        self.events.extend(events);
        tracing::debug!(
            added = self.events.len() - before,
            total = self.events.len(),
            "added events to aggregator"
        );
    }

    /// Removes all stored events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Returns a copy of all stored events.
    pub fn events(&self) -> Vec<Event> {
        self.events.clone()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the stored events matching `filter`, in insertion order.
    pub fn filter(&self, filter: &EventFilter<'_>) -> Vec<Event> {
        filter.apply(&self.events)
    }

    /// Filters, then computes grouped counts and the date range.
    pub fn aggregate(&self, filter: &EventFilter<'_>) -> AggregationResult {
        let mut events = self.filter(filter);

        let mut result = AggregationResult {
            total_count: events.len(),
            ..AggregationResult::default()
        };
        let mut span = Span::default();

        for event in &events {
            *result
                .by_repository
                .entry(event.repository.full_name())
                .or_insert(0) += 1;
            *result
                .by_contributor
                .entry(event.contributor.username.clone())
                .or_insert(0) += 1;
            *result.by_kind.entry(event.kind).or_insert(0) += 1;
            span.observe(event.timestamp);
        }

        // Stable sort keeps insertion order for equal timestamps
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        result.events = events;
        result.date_range = (span.first, span.last);
        result
    }

    /// Rollup for one contributor, or `None` when they have no events.
    pub fn contributor_stats(&self, username: &str) -> Option<ContributorStats> {
        let mut matching = self
            .events
            .iter()
            .filter(|e| e.contributor.username == username);
        let first = matching.next()?;

        let mut stats = ContributorStats {
            contributor: first.contributor.clone(),
            total: 0,
            by_kind: BTreeMap::new(),
            by_repository: BTreeMap::new(),
            first_activity: first.timestamp,
            last_activity: first.timestamp,
        };

        for event in std::iter::once(first).chain(matching) {
            stats.total += 1;
            *stats.by_kind.entry(event.kind).or_insert(0) += 1;
            *stats
                .by_repository
                .entry(event.repository.full_name())
                .or_insert(0) += 1;
            stats.first_activity = stats.first_activity.min(event.timestamp);
            stats.last_activity = stats.last_activity.max(event.timestamp);
        }

        Some(stats)
    }

    /// Rollup for one repository keyed by `owner/name`, or `None` when it has no events.
    pub fn repository_stats(&self, full_name: &str) -> Option<RepositoryStats> {
        let mut matching = self
            .events
            .iter()
            .filter(|e| e.repository.full_name() == full_name);
        let first = matching.next()?;

        let mut stats = RepositoryStats {
            repository: first.repository.clone(),
            total: 0,
            by_kind: BTreeMap::new(),
            contributors: BTreeSet::new(),
            first_activity: first.timestamp,
            last_activity: first.timestamp,
        };

        for event in std::iter::once(first).chain(matching) {
            stats.total += 1;
            *stats.by_kind.entry(event.kind).or_insert(0) += 1;
            stats.contributors.insert(event.contributor.username.clone());
            stats.first_activity = stats.first_activity.min(event.timestamp);
            stats.last_activity = stats.last_activity.max(event.timestamp);
        }

        Some(stats)
    }

    /// Event counts per calendar bucket within the optional time bounds.
    pub fn timeline(
        &self,
        granularity: Granularity,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> BTreeMap<String, usize> {
        let filter = EventFilter::new().between(since, until);
        bucket_counts(self.events.iter().filter(|e| filter.matches(e)), granularity)
    }

    /// Most active contributors by raw event count. Ties keep first-seen order.
    pub fn top_contributors(&self, limit: usize) -> Vec<(String, usize)> {
        top_n(&self.events, |e| e.contributor.username.clone(), limit)
    }

    /// Most active repositories (`owner/name`) by raw event count. Ties keep first-seen order.
    pub fn top_repositories(&self, limit: usize) -> Vec<(String, usize)> {
        top_n(&self.events, |e| e.repository.full_name(), limit)
    }
}
