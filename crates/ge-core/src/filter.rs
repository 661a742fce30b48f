//! Predicate-based selection over event collections.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::event::Event;
use crate::event_kind::EventKind;
use crate::repository::Repository;

type Predicate<'a> = Box<dyn Fn(&Event) -> bool + 'a>;

/// A conjunction of optional criteria.
///
/// Criteria left unset (or set to an empty list) impose no constraint.
/// `since` and `until` are both inclusive bounds on the canonical timestamp.
#[derive(Default)]
pub struct EventFilter<'a> {
    repositories: HashSet<String>,
    contributors: HashSet<String>,
    kinds: HashSet<EventKind>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    predicate: Option<Predicate<'a>>,
}

impl<'a> EventFilter<'a> {
    /// A filter with no criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to events whose repository `owner/name` is in the list.
    #[must_use]
    pub fn repositories<'r>(mut self, repositories: impl IntoIterator<Item = &'r Repository>) -> Self {
        self.repositories = repositories.into_iter().map(Repository::full_name).collect();
        self
    }

    /// Restrict to events from repositories with the given `owner/name` keys.
    #[must_use]
    pub fn repository_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.repositories = names.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to events by the given usernames.
    #[must_use]
    pub fn contributors<S: Into<String>>(mut self, usernames: impl IntoIterator<Item = S>) -> Self {
        self.contributors = usernames.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to the given event kinds.
    #[must_use]
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub const fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Sets both time bounds from optional values.
    #[must_use]
    pub const fn between(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Adds an arbitrary predicate, evaluated after all other criteria.
    #[must_use]
    pub fn predicate(mut self, predicate: impl Fn(&Event) -> bool + 'a) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Returns true if the event satisfies every supplied criterion.
    pub fn matches(&self, event: &Event) -> bool {
        if !self.repositories.is_empty() && !self.repositories.contains(&event.repository.full_name())
        {
            return false;
        }
        if !self.contributors.is_empty() && !self.contributors.contains(&event.contributor.username) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        if self.since.is_some_and(|since| event.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| event.timestamp > until) {
            return false;
        }
        self.predicate.as_ref().is_none_or(|predicate| predicate(event))
    }

    /// Returns copies of the matching events, preserving their relative order.
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

impl fmt::Debug for EventFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFilter")
            .field("repositories", &self.repositories)
            .field("contributors", &self.contributors)
            .field("kinds", &self.kinds)
            .field("since", &self.since)
            .field("until", &self.until)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Free-function form of [`EventFilter::apply`].
pub fn filter_events(events: &[Event], filter: &EventFilter<'_>) -> Vec<Event> {
    filter.apply(events)
}
