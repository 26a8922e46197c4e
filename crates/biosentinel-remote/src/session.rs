use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use biosentinel_core::error::{BioSentinelError, Result};

/// Explicit connection to an HTTP collaborator.
///
/// Every request is bounded by the session timeout. Failures come back as a
/// plain reason string so each port method can wrap it in its own error kind.
pub struct RemoteSession {
    /// Base URL without a trailing slash (e.g., "http://localhost:8600")
    base_url: String,

    timeout: Duration,

    client: reqwest::Client,

    runtime: tokio::runtime::Runtime,
}

impl RemoteSession {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            BioSentinelError::ConfigInvalid {
                key: "remote_url".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        Ok(Self { base_url, timeout, client, runtime })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and decode a JSON response
    pub(crate) fn post_json<B, T>(&self, path: &str, body: &B) -> std::result::Result<T, String>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        self.runtime.block_on(async {
            let response = self.send(&url, body).await?;
            response.json::<T>().await.map_err(|e| format!("invalid response from {}: {}", url, e))
        })
    }

    /// POST a JSON body and return the raw response bytes
    pub(crate) fn post_bytes<B: Serialize>(&self, path: &str, body: &B) -> std::result::Result<Vec<u8>, String> {
        let url = self.url(path);
        self.runtime.block_on(async {
            let response = self.send(&url, body).await?;
            let bytes = response.bytes().await.map_err(|e| self.describe(&url, e))?;
            Ok(bytes.to_vec())
        })
    }

    async fn send<B: Serialize>(&self, url: &str, body: &B) -> std::result::Result<reqwest::Response, String> {
        tracing::debug!(url, "POST");

        let response =
            self.client.post(url).json(body).send().await.map_err(|e| self.describe(url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("{} returned {}: {}", url, status, error_text));
        }
        Ok(response)
    }

    fn describe(&self, url: &str, error: reqwest::Error) -> String {
        if error.is_timeout() {
            format!("request to {} timed out after {}s", url, self.timeout.as_secs())
        } else {
            format!("request to {} failed: {}", url, error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = RemoteSession::new("http://localhost:8600/", Duration::from_secs(30)).unwrap();
        assert_eq!(session.base_url(), "http://localhost:8600");
        assert_eq!(session.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_url_joining() {
        let session = RemoteSession::new("http://imagery:9000", Duration::from_secs(1)).unwrap();
        assert_eq!(session.url("/v1/projects/p/rasters:fetch"), "http://imagery:9000/v1/projects/p/rasters:fetch");
        assert_eq!(session.url("predict"), "http://imagery:9000/predict");
    }

    #[test]
    fn test_unreachable_host_reports_url() {
        let session = RemoteSession::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = session.post_bytes("rasters", &serde_json::json!({})).unwrap_err();
        assert!(err.contains("http://127.0.0.1:1/rasters"));
    }
}
