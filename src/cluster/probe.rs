//! Probe Client
//!
//! Shared HTTP client for node probes. Every request carries a bounded
//! timeout; an elapsed bound surfaces as `Error::ProbeTimeout` so callers
//! can fold it into liveness/leader state.

use std::time::Duration;
use tokio::time::timeout;

use crate::error::{Error, Result};

/// HTTP prober shared by the Health Monitor and Leader Locator
#[derive(Clone)]
pub struct ProbeClient {
    client: reqwest::Client,
}

impl ProbeClient {
    /// Create a new probe client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Check whether a node answers its liveness path with a success
    /// status within the bound. All failures collapse to `false`.
    pub async fn check(&self, address: &str, path: &str, bound: Duration) -> bool {
        match self.get_text(address, path, bound).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Liveness probe failed for {}: {}", address, e);
                false
            }
        }
    }

    /// Fetch a text payload from a node path within the bound
    pub async fn get_text(&self, address: &str, path: &str, bound: Duration) -> Result<String> {
        let url = format!("{}{}", Self::base_url(address), path);

        match timeout(bound, self.fetch(address, &url)).await {
            Ok(result) => result,
            Err(_) => Err(Error::ProbeTimeout(address.to_string())),
        }
    }

    /// Request without the timeout wrapper
    async fn fetch(&self, address: &str, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Error::Network(format!("reading body from {} failed: {}", url, e)))
    }

    /// Normalize a configured address into a base URL
    pub fn base_url(address: &str) -> String {
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        }
    }
}

impl Default for ProbeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(ProbeClient::base_url("127.0.0.1:8001"), "http://127.0.0.1:8001");
        assert_eq!(ProbeClient::base_url("http://node-1:8001"), "http://node-1:8001");
        assert_eq!(ProbeClient::base_url("https://node-1:8001"), "https://node-1:8001");
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let probe = ProbeClient::new();
        // Nothing listens on this port
        let result = probe
            .get_text("127.0.0.1:1", "/health", Duration::from_millis(500))
            .await;

        let err = result.unwrap_err();
        assert!(err.is_transport());
    }
}
