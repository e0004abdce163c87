use super::dedupe_by_email;
use crate::core::{IncomingEvent, Result, SyncError};
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// A repository whose commits count as one activity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    pub host: String,
    pub project_id: String,
    pub activity: String,
}

impl RepositorySpec {
    /// Parse a `host<sep>project<sep>activity` entry. Empty segments are
    /// ignored; extra trailing segments are too.
    pub fn parse(entry: &str, separator: &str) -> Result<Self> {
        let parts: Vec<&str> = entry
            .split(separator)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.len() < 3 {
            return Err(SyncError::InvalidConfig(format!(
                "repository entry '{}' needs host, project and activity",
                entry
            )));
        }

        Ok(Self {
            host: parts[0].trim_end_matches('/').to_string(),
            project_id: parts[1].to_string(),
            activity: parts[2].to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    #[serde(skip)]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub author_email: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// Branches and commits fetched for one repository.
#[derive(Debug, Clone)]
pub struct RepositoryActivity {
    pub spec: RepositorySpec,
    pub branches: Vec<Branch>,
}

/// Half-open `[since, until)` range of calendar dates commits are fetched for.
///
/// GitLab reads a bare date as midnight at the start of that day, so `until`
/// is the day after the last collected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl CommitWindow {
    /// Window covering `lookback_days` whole days, the last of which is `day`.
    /// A lookback of zero still covers `day` itself.
    pub fn ending(day: NaiveDate, lookback_days: u32) -> Self {
        let extra = u64::from(lookback_days.max(1) - 1);
        let since = day.checked_sub_days(Days::new(extra)).unwrap_or(NaiveDate::MIN);
        let until = day.succ_opt().unwrap_or(NaiveDate::MAX);
        Self { since, until }
    }

    /// `since` and `until` query values, formatted as `YYYY-MM-DD`.
    pub fn query_dates(&self) -> (String, String) {
        (
            self.since.format("%Y-%m-%d").to_string(),
            self.until.format("%Y-%m-%d").to_string(),
        )
    }
}

/// One event per commit author across all repositories and branches.
///
/// Commit events carry only an email; identity is resolved later against the
/// contact directory.
pub fn commit_events(repositories: &[RepositoryActivity]) -> Vec<IncomingEvent> {
    let events = repositories
        .iter()
        .flat_map(|repo| {
            repo.branches.iter().flat_map(move |branch| {
                branch.commits.iter().map(move |commit| IncomingEvent {
                    person_id: None,
                    email: commit.author_email.clone(),
                    date: commit.created_at.date_naive(),
                    activity: repo.spec.activity.clone(),
                    paths: Default::default(),
                })
            })
        })
        .collect();

    dedupe_by_email(events)
}
