use crate::core::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Which contact identity keys a persisted record when the store is seeded.
///
/// New records created during a merge are always keyed by the event's
/// resolved identity, which prefers the primary contact. With
/// `RootThenPrimary` a person holding both roles can therefore end up with
/// two records for the same month. Which order is correct is still open with
/// the ledger owners, so both are kept selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SeedKeyOrder {
    #[default]
    RootThenPrimary,
    PrimaryThenRoot,
}

/// How event emails are compared against directory emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmailMatching {
    #[default]
    Exact,
    CaseInsensitive,
}

impl EmailMatching {
    pub fn matches(self, left: &str, right: &str) -> bool {
        match self {
            EmailMatching::Exact => left == right,
            EmailMatching::CaseInsensitive => left.eq_ignore_ascii_case(right),
        }
    }
}

/// Source control repositories scanned for commit activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceControlConfig {
    /// Raw `host;project;activity` entries
    pub repositories: Vec<String>,
    /// Separator between entry segments
    pub separator: String,
    /// API token sent as `PRIVATE-TOKEN`
    pub token: Option<String>,
    /// Days before the collection day that commits are fetched for
    pub lookback_days: u32,
}

impl Default for SourceControlConfig {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            separator: ";".to_string(),
            token: None,
            lookback_days: 1,
        }
    }
}

/// Outbound delivery of collected events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub url: Option<String>,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl DeliveryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_attempts: 3,
            retry_delay_secs: 300,
        }
    }
}

/// Configuration for one reconciliation run and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub seed_key_order: SeedKeyOrder,
    pub email_matching: EmailMatching,
    /// Activity label given to mentoring calendar events
    pub mentoring_activity: String,
    /// Compute the change set without writing it back
    pub dry_run: bool,
    pub source_control: SourceControlConfig,
    pub delivery: DeliveryConfig,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self {
            seed_key_order: SeedKeyOrder::default(),
            email_matching: EmailMatching::default(),
            mentoring_activity: "Mentoring".to_string(),
            dry_run: false,
            source_control: SourceControlConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }

    /// Load a JSON configuration file; missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            SyncError::InvalidConfig(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config: SyncConfig = serde_json::from_str(&raw).map_err(|e| {
            SyncError::InvalidConfig(format!("cannot parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn seed_key_order(mut self, order: SeedKeyOrder) -> Self {
        self.seed_key_order = order;
        self
    }

    pub fn email_matching(mut self, matching: EmailMatching) -> Self {
        self.email_matching = matching;
        self
    }

    pub fn mentoring_activity(mut self, label: &str) -> Self {
        self.mentoring_activity = label.to_string();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn repository(mut self, entry: &str) -> Self {
        self.source_control.repositories.push(entry.to_string());
        self
    }

    pub fn delivery_url(mut self, url: &str) -> Self {
        self.delivery.url = Some(url.to_string());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.mentoring_activity.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "mentoring_activity cannot be empty".to_string(),
            ));
        }

        if self.source_control.separator.is_empty() {
            return Err(SyncError::InvalidConfig(
                "source_control.separator cannot be empty".to_string(),
            ));
        }

        if self.delivery.max_attempts == 0 {
            return Err(SyncError::InvalidConfig(
                "delivery.max_attempts must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
