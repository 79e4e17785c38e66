//! HTTP client for the remote collector.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::http::ResponseExt;
use crate::traits::{ContentSummary, SessionSummary, Uplink};

/// Collector endpoints and client settings (`[collector]` in config.toml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Receives `{url, startTime, endTime, duration}`; unset disables session uploads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_endpoint: Option<String>,
    /// Receives `{url, html}`; unset disables content uploads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            session_endpoint: None,
            content_endpoint: None,
            timeout_secs: 10,
        }
    }
}

/// Collector client posting JSON summaries
pub struct HttpCollector {
    client: Client,
    session_endpoint: Option<String>,
    content_endpoint: Option<String>,
}

impl HttpCollector {
    /// Create a collector client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("footprint/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            session_endpoint: config.session_endpoint.clone(),
            content_endpoint: config.content_endpoint.clone(),
        })
    }

    async fn post<T: Serialize + Sync>(&self, endpoint: Option<&str>, body: &T) -> Result<()> {
        let Some(endpoint) = endpoint else {
            log::debug!("Collector endpoint not configured, dropping payload");
            return Ok(());
        };

        self.client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach collector at {endpoint}"))?
            .ensure_success(endpoint)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Uplink for HttpCollector {
    async fn send_session(&self, summary: &SessionSummary) -> Result<()> {
        self.post(self.session_endpoint.as_deref(), summary).await?;
        log::debug!(
            "Sent session summary for {} ({} ms)",
            summary.url,
            summary.duration
        );
        Ok(())
    }

    async fn send_content(&self, summary: &ContentSummary) -> Result<()> {
        self.post(self.content_endpoint.as_deref(), summary).await?;
        log::debug!(
            "Sent page content for {} ({} chars)",
            summary.url,
            summary.html.chars().count()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http-collector"
    }
}
