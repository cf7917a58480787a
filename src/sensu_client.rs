//! Sensu agent events API client
//!
//! Posts a single event to `http://{host}:{port}/events`. There is no retry:
//! snmptrapd does not redeliver a trap, so a failed post is reported and the
//! process exits non-zero.

use crate::config::SensuAgentApiConfig;
use crate::event::{Event, EventError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("failed to send event to {url}: {source}")]
    Send {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Sensu agent rejected event with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

pub struct SensuClient {
    client: Client,
    url: String,
}

impl SensuClient {
    pub fn new(api: &SensuAgentApiConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(seconds) = api.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build().map_err(ClientError::Build)?;

        Ok(Self {
            client,
            url: api.events_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post the event and return the response body.
    pub async fn send_event(&self, event: &Event) -> Result<String, ClientError> {
        let payload = event.to_json()?;
        debug!("Posting {} byte event to {}", payload.len(), self.url);

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|source| ClientError::Send {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ClientError::Body {
            url: self.url.clone(),
            source,
        })?;

        if status.is_success() {
            info!(
                "Sensu agent accepted event {}: {} ({})",
                event.check_name(),
                status.as_u16(),
                status.canonical_reason().unwrap_or("OK")
            );
            Ok(body)
        } else {
            error!(
                "Sensu agent at {} returned {} {}",
                self.url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            if !body.is_empty() {
                error!("Response body: {}", body);
            }
            Err(ClientError::Status { status, body })
        }
    }
}
