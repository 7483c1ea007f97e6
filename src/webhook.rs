//! Etendo webhook caller
//!
//! A webhook is a named, pre-registered server-side endpoint invoked by POSTing
//! a JSON body to `<host>/webhooks/?name=<name>`.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn, Instrument};
use url::Url;

/// Webhook call errors
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid Etendo host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Displays the raw response body so callers can hand it back verbatim
    #[error("{body}")]
    Rejected { status: u16, body: String },
    #[error("Webhook returned a non-JSON body: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Client for named webhooks on one Etendo host
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    host: String,
}

impl WebhookClient {
    pub fn new(client: Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL for a webhook (pure function)
    pub fn webhook_url(host: &str, name: &str) -> Result<Url, WebhookError> {
        let base = format!("{}/webhooks/", host.trim_end_matches('/'));
        let mut url = Url::parse(&base).map_err(|source| WebhookError::InvalidHost {
            host: host.to_string(),
            source,
        })?;
        url.query_pairs_mut().append_pair("name", name);
        Ok(url)
    }

    /// POST `body` to the named webhook and decode the JSON reply
    pub async fn call(&self, name: &str, body: &Value, token: &str) -> Result<Value, WebhookError> {
        let span = crate::webhook_span!(webhook = name);
        self.post(name, body, token).instrument(span).await
    }

    async fn post(&self, name: &str, body: &Value, token: &str) -> Result<Value, WebhookError> {
        let url = Self::webhook_url(&self.host, name)?;
        debug!(%url, "Calling webhook (POST)");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Webhook rejected the call");
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
