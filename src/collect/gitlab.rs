//! Minimal GitLab REST client for branch and commit listings.

use super::commits::{Branch, Commit, CommitWindow, RepositoryActivity, RepositorySpec};
use crate::core::{Result, SyncError};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const API_PREFIX: &str = "/api/v4/projects";
const PRIVATE_TOKEN: &str = "private-token";

/// Some endpoints answer with a bare object where a list is expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

pub struct GitLabClient {
    client: reqwest::Client,
}

impl GitLabClient {
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| SyncError::InvalidConfig(format!("invalid token: {}", e)))?;
            headers.insert(PRIVATE_TOKEN, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::SourceControl(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn branches(&self, spec: &RepositorySpec) -> Result<Vec<Branch>> {
        let url = format!(
            "{}{}/{}/repository/branches",
            spec.host, API_PREFIX, spec.project_id
        );
        self.get_collection(&url, &[]).await
    }

    pub async fn commits(
        &self,
        spec: &RepositorySpec,
        branch: &str,
        window: CommitWindow,
    ) -> Result<Vec<Commit>> {
        let url = format!(
            "{}{}/{}/repository/commits",
            spec.host, API_PREFIX, spec.project_id
        );
        let (since, until) = window.query_dates();
        self.get_collection(
            &url,
            &[("ref_name", branch), ("since", &since), ("until", &until)],
        )
        .await
    }

    /// Fetch every branch of every repository with its commits in `window`.
    pub async fn collect(
        &self,
        specs: &[RepositorySpec],
        window: CommitWindow,
    ) -> Result<Vec<RepositoryActivity>> {
        let mut repositories = Vec::with_capacity(specs.len());

        for spec in specs {
            let mut branches = self.branches(spec).await?;
            for branch in &mut branches {
                branch.commits = self.commits(spec, &branch.name, window).await?;
            }
            debug!(
                project = %spec.project_id,
                branches = branches.len(),
                "repository scanned"
            );
            repositories.push(RepositoryActivity {
                spec: spec.clone(),
                branches,
            });
        }

        Ok(repositories)
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SyncError::SourceControl(format!("GET {}: {}", url, e)))?;

        let body: OneOrMany<T> = response
            .json()
            .await
            .map_err(|e| SyncError::SourceControl(format!("decoding {}: {}", url, e)))?;
        Ok(body.into())
    }
}
