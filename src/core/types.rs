use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable numeric identity of a person across both contact lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl PersonId {
    /// Identity used for persisted records that carry neither contact.
    pub const UNKNOWN: PersonId = PersonId(0);
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PersonId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Composite ledger key: one record per person per calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub person: PersonId,
    pub year: i32,
    pub month: u32,
}

impl LedgerKey {
    pub fn new(person: PersonId, year: i32, month: u32) -> Self {
        Self {
            person,
            year,
            month,
        }
    }

    /// Key for the month containing `date`.
    pub fn for_date(person: PersonId, date: NaiveDate) -> Self {
        Self::new(person, date.year(), date.month())
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}-{:02})", self.person, self.year, self.month)
    }
}

/// One row of a contact role list (primary or root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub person_id: PersonId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub paths: BTreeSet<String>,
}

impl RoleAssignment {
    pub fn new(person_id: impl Into<PersonId>, email: Option<&str>) -> Self {
        Self {
            person_id: person_id.into(),
            email: email.map(str::to_string),
            paths: BTreeSet::new(),
        }
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }
}

/// A raw activity observation collected from source control or the calendar.
///
/// `person_id` stays empty until the resolver binds it; a successful email
/// lookup writes the identity back so later lookups skip the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingEvent {
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub email: Option<String>,
    pub date: NaiveDate,
    pub activity: String,
    #[serde(default)]
    pub paths: BTreeSet<String>,
}

impl IncomingEvent {
    pub fn for_person(person_id: impl Into<PersonId>, date: NaiveDate, activity: &str) -> Self {
        Self {
            person_id: Some(person_id.into()),
            email: None,
            date,
            activity: activity.to_string(),
            paths: BTreeSet::new(),
        }
    }

    pub fn for_email(email: &str, date: NaiveDate, activity: &str) -> Self {
        Self {
            person_id: None,
            email: Some(email.to_string()),
            date,
            activity: activity.to_string(),
            paths: BTreeSet::new(),
        }
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }
}

/// A ledger row as the storage collaborator returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedActivityRecord {
    pub persisted_id: u64,
    #[serde(default)]
    pub root_contact: Option<PersonId>,
    #[serde(default)]
    pub primary_contact: Option<PersonId>,
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub activity_types: BTreeSet<String>,
    #[serde(default)]
    pub paths: BTreeSet<String>,
}
