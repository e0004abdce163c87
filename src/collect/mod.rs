//! Collection of raw activity events from source control and the mentoring
//! calendar.

pub mod calendar;
pub mod commits;
pub mod gitlab;

pub use calendar::{CalendarEntry, mentoring_events};
pub use commits::{Branch, Commit, CommitWindow, RepositoryActivity, RepositorySpec, commit_events};
pub use gitlab::GitLabClient;

use crate::core::IncomingEvent;
use std::collections::HashSet;

/// Keep the first event per email. Events without an email count as one group.
pub fn dedupe_by_email(events: Vec<IncomingEvent>) -> Vec<IncomingEvent> {
    let mut seen: HashSet<Option<String>> = HashSet::new();
    events
        .into_iter()
        .filter(|event| seen.insert(event.email.clone()))
        .collect()
}
