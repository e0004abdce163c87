//! Outbound delivery of collected activity events.

use crate::config::DeliveryConfig;
use crate::core::{IncomingEvent, Result, SyncError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{info, warn};

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, events: &[IncomingEvent]) -> Result<()>;
}

/// Retry schedule for delivery attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryRetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for DeliveryRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(300),
        }
    }
}

impl From<&DeliveryConfig> for DeliveryRetryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// POSTs events as a JSON array; only `200 OK` counts as delivered.
pub struct HttpEventSink {
    client: reqwest::Client,
    url: String,
    retry: DeliveryRetryPolicy,
}

impl HttpEventSink {
    pub fn new(url: &str, retry: DeliveryRetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            retry,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| SyncError::InvalidConfig("delivery.url is not set".to_string()))?;
        Ok(Self::new(url, DeliveryRetryPolicy::from(config)))
    }

    async fn attempt(&self, events: &[IncomingEvent]) -> std::result::Result<(), String> {
        let response = self
            .client
            .post(&self.url)
            .json(events)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(format!("unexpected status {}", status)),
        }
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn deliver(&self, events: &[IncomingEvent]) -> Result<()> {
        let mut last_error = String::new();

        for attempt in 1..=self.retry.max_attempts {
            match self.attempt(events).await {
                Ok(()) => {
                    info!(events = events.len(), attempt, "activity events delivered");
                    return Ok(());
                }
                Err(err) => {
                    warn!(attempt, error = %err, "activity delivery attempt failed");
                    last_error = err;
                }
            }

            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.delay).await;
            }
        }

        Err(SyncError::Delivery(format!(
            "{} failed after {} attempts: {}",
            self.url, self.retry.max_attempts, last_error
        )))
    }
}
