//! Unified contact directory.
//!
//! Primary and root contacts arrive as two separate role lists. The directory
//! folds them into one `Person` per identity: a root-contact row whose
//! identity is already known attaches its role to that person instead of
//! creating a second one.

use crate::config::EmailMatching;
use crate::core::{PersonId, RoleAssignment};
use std::collections::{BTreeSet, HashMap};

/// Role-specific contact data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactRole {
    pub email: Option<String>,
    pub paths: BTreeSet<String>,
}

impl ContactRole {
    fn absorb(&mut self, assignment: RoleAssignment) {
        if self.email.is_none() {
            self.email = assignment.email;
        }
        self.paths.extend(assignment.paths);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub primary: Option<ContactRole>,
    pub root: Option<ContactRole>,
}

impl Person {
    pub fn is_primary_contact(&self) -> bool {
        self.primary.is_some()
    }

    pub fn is_root_contact(&self) -> bool {
        self.root.is_some()
    }

    /// Primary-contact email, falling back to the root-contact one.
    pub fn email(&self) -> Option<&str> {
        self.primary
            .as_ref()
            .and_then(|role| role.email.as_deref())
            .or_else(|| self.root.as_ref().and_then(|role| role.email.as_deref()))
    }

    /// Union of the paths of every role this person holds.
    pub fn paths(&self) -> BTreeSet<String> {
        self.primary
            .iter()
            .chain(self.root.iter())
            .flat_map(|role| role.paths.iter().cloned())
            .collect()
    }

    pub fn matches_email(&self, email: &str, matching: EmailMatching) -> bool {
        [self.primary.as_ref(), self.root.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|role| role.email.as_deref())
            .any(|candidate| matching.matches(candidate, email))
    }

    /// Identity written into the primary-contact field of a ledger record.
    pub fn primary_contact(&self) -> Option<PersonId> {
        self.primary.as_ref().map(|_| self.id)
    }

    /// Identity written into the root-contact field of a ledger record.
    pub fn root_contact(&self) -> Option<PersonId> {
        self.root.as_ref().map(|_| self.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersonDirectory {
    persons: Vec<Person>,
    by_id: HashMap<PersonId, usize>,
}

impl PersonDirectory {
    /// Unify both role lists. Primary contacts are placed first, so email
    /// scans see them before root-only persons.
    pub fn build(primary: Vec<RoleAssignment>, root: Vec<RoleAssignment>) -> Self {
        let mut directory = Self::default();

        for assignment in primary {
            directory
                .entry(assignment.person_id)
                .primary
                .get_or_insert_with(ContactRole::default)
                .absorb(assignment);
        }

        for assignment in root {
            directory
                .entry(assignment.person_id)
                .root
                .get_or_insert_with(ContactRole::default)
                .absorb(assignment);
        }

        directory
    }

    fn entry(&mut self, id: PersonId) -> &mut Person {
        let idx = match self.by_id.get(&id) {
            Some(&idx) => idx,
            None => {
                self.persons.push(Person {
                    id,
                    primary: None,
                    root: None,
                });
                let idx = self.persons.len() - 1;
                self.by_id.insert(id, idx);
                idx
            }
        };
        &mut self.persons[idx]
    }

    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.by_id.get(&id).map(|&idx| &self.persons[idx])
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// First person, in directory order, holding `email` in either role.
    pub fn find_by_email(&self, email: &str, matching: EmailMatching) -> Option<&Person> {
        self.persons
            .iter()
            .find(|person| person.matches_email(email, matching))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.persons.iter()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}
