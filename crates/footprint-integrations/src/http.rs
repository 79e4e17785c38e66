//! HTTP utilities for the collector client.

use anyhow::Result;

/// Extension trait for reqwest::Response to handle common error patterns.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Ensure the response status is successful, returning an error with details if not.
    ///
    /// # Errors
    ///
    /// Returns an error if the response status is not successful (2xx),
    /// including the status code and a prefix of the response body.
    async fn ensure_success(self, endpoint: &str) -> Result<Self>
    where
        Self: Sized;
}

/// Longest response body quoted in an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn ensure_success(self, endpoint: &str) -> Result<Self> {
        if !self.status().is_success() {
            let status = self.status();
            let error_text = self.text().await.unwrap_or_default();
            let excerpt: String = error_text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            anyhow::bail!("Collector error from {endpoint} ({status}): {excerpt}");
        }
        Ok(self)
    }
}
