//! Attribution of incoming events to directory persons.

use crate::config::EmailMatching;
use crate::core::{IncomingEvent, PersonId};
use crate::directory::PersonDirectory;
use crate::observer::SyncObserver;
use std::fmt;

/// Why an event could not be attributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The event named an identity the directory does not hold.
    UnknownPerson(PersonId),
    /// No directory person carries the event's email in either role.
    UnknownEmail(String),
    /// The event has neither an identity nor an email.
    MissingIdentity,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::UnknownPerson(id) => write!(f, "unknown person {}", id),
            UnresolvedReason::UnknownEmail(email) => write!(f, "unknown email '{}'", email),
            UnresolvedReason::MissingIdentity => write!(f, "no person id or email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(PersonId),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn person(&self) -> Option<PersonId> {
        match self {
            Resolution::Resolved(id) => Some(*id),
            Resolution::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

pub struct EventResolver<'a> {
    directory: &'a PersonDirectory,
    matching: EmailMatching,
    observer: &'a dyn SyncObserver,
}

impl<'a> EventResolver<'a> {
    pub fn new(
        directory: &'a PersonDirectory,
        matching: EmailMatching,
        observer: &'a dyn SyncObserver,
    ) -> Self {
        Self {
            directory,
            matching,
            observer,
        }
    }

    /// Bind `event.person_id`.
    ///
    /// A present identity must exist in the directory. Otherwise the email is
    /// looked up against both roles and, on a hit, cached back on the event.
    /// Misses are reported to the observer and leave the event untouched.
    pub fn resolve(&self, event: &mut IncomingEvent) -> Resolution {
        let resolution = self.lookup(event);

        match &resolution {
            Resolution::Resolved(id) => event.person_id = Some(*id),
            Resolution::Unresolved(reason) => self.observer.event_dropped(event, reason),
        }

        resolution
    }

    fn lookup(&self, event: &IncomingEvent) -> Resolution {
        if let Some(id) = event.person_id {
            return if self.directory.contains(id) {
                Resolution::Resolved(id)
            } else {
                Resolution::Unresolved(UnresolvedReason::UnknownPerson(id))
            };
        }

        let Some(email) = event.email.as_deref() else {
            return Resolution::Unresolved(UnresolvedReason::MissingIdentity);
        };

        match self.directory.find_by_email(email, self.matching) {
            Some(person) => Resolution::Resolved(person.id),
            None => Resolution::Unresolved(UnresolvedReason::UnknownEmail(email.to_string())),
        }
    }
}
