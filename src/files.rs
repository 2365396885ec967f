//! File operation relay
//!
//! Forwards file requests to whichever node the last discovery round
//! confirmed as leader. The relay never interprets payloads: bodies,
//! content types and upstream statuses cross unchanged in both
//! directions, so a storage-node rejection reaches the caller as-is.
//! Without a confirmed leader every operation fails fast.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::cluster::ProbeClient;
use crate::error::{Error, Result};
use crate::state::CoordinationState;

/// Response relayed from the leader, status preserved verbatim
#[derive(Debug)]
pub struct Upstream {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Relay for file operations against the current leader
pub struct FileProxy {
    state: Arc<CoordinationState>,
    client: reqwest::Client,
}

impl FileProxy {
    /// Create a relay with the given per-request timeout
    pub fn new(state: Arc<CoordinationState>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to create relay client: {}", e)))?;

        Ok(Self { state, client })
    }

    /// List stored files
    pub async fn list(&self) -> Result<Upstream> {
        let url = self.leader_url("/files").await?;
        self.relay(self.client.get(&url)).await
    }

    /// Store a file. The caller's body and content type cross unchanged,
    /// so multipart boundaries survive the hop.
    pub async fn upload(&self, content_type: Option<&str>, body: Bytes) -> Result<Upstream> {
        let url = self.leader_url("/upload").await?;
        let mut request = self.client.post(&url).body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        self.relay(request).await
    }

    /// Fetch a stored file by name
    pub async fn download(&self, name: &str) -> Result<Upstream> {
        let url = self.leader_url("/download").await?;
        self.relay(self.client.get(&url).query(&[("name", name)])).await
    }

    /// Delete a stored file by name
    pub async fn delete(&self, name: &str) -> Result<Upstream> {
        let url = self.leader_url("/delete").await?;
        self.relay(self.client.delete(&url).query(&[("name", name)])).await
    }

    /// Fetch storage usage figures
    pub async fn stats(&self) -> Result<Upstream> {
        let url = self.leader_url("/stats").await?;
        self.relay(self.client.get(&url)).await
    }

    /// Resolve a path against the confirmed leader, if there is one
    async fn leader_url(&self, path: &str) -> Result<String> {
        let leader = self.state.leader().await;
        let address = leader.address.ok_or(Error::NoLeader)?;
        let url = format!("{}{}", ProbeClient::base_url(&address), path);
        debug!("relaying file request to leader at {}", url);
        Ok(url)
    }

    async fn relay(&self, request: reqwest::RequestBuilder) -> Result<Upstream> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("file relay failed: {}", e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("reading relayed body failed: {}", e)))?;

        Ok(Upstream {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::LeaderInfo;
    use axum::extract::Query;
    use axum::routing::{delete, get, post};
    use axum::Router;
    use std::collections::HashMap;

    async fn spawn_storage_node() -> String {
        let app = Router::new()
            .route("/files", get(|| async { axum::Json(vec!["a.txt", "b.txt"]) }))
            .route(
                "/upload",
                post(|| async { (axum::http::StatusCode::FORBIDDEN, "not the leader") }),
            )
            .route(
                "/download",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    format!("contents of {}", params["name"])
                }),
            )
            .route(
                "/delete",
                delete(|Query(params): Query<HashMap<String, String>>| async move {
                    format!("deleted {}", params["name"])
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn state_with_leader(address: Option<&str>) -> Arc<CoordinationState> {
        let state = Arc::new(CoordinationState::new(&["A".to_string()]));
        if let Some(address) = address {
            state
                .publish_leader(LeaderInfo {
                    name: Some(format!("Current Leader: {}", address)),
                    address: Some(address.to_string()),
                })
                .await;
        }
        state
    }

    fn proxy_for(state: Arc<CoordinationState>) -> FileProxy {
        FileProxy::new(state, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fails_fast_without_confirmed_leader() {
        let proxy = proxy_for(state_with_leader(None).await);
        assert!(matches!(proxy.list().await, Err(Error::NoLeader)));
        assert!(matches!(proxy.stats().await, Err(Error::NoLeader)));
    }

    #[tokio::test]
    async fn test_relays_listing_from_leader() {
        let addr = spawn_storage_node().await;
        let proxy = proxy_for(state_with_leader(Some(&addr)).await);

        let upstream = proxy.list().await.unwrap();
        assert_eq!(upstream.status, 200);
        assert_eq!(
            upstream.content_type.as_deref(),
            Some("application/json")
        );
        let names: Vec<String> = serde_json::from_slice(&upstream.body).unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_upstream_rejection_crosses_verbatim() {
        let addr = spawn_storage_node().await;
        let proxy = proxy_for(state_with_leader(Some(&addr)).await);

        let upstream = proxy
            .upload(Some("multipart/form-data; boundary=x"), Bytes::from("body"))
            .await
            .unwrap();
        assert_eq!(upstream.status, 403);
        assert_eq!(&upstream.body[..], b"not the leader");
    }

    #[tokio::test]
    async fn test_query_parameters_reach_the_leader() {
        let addr = spawn_storage_node().await;
        let proxy = proxy_for(state_with_leader(Some(&addr)).await);

        let download = proxy.download("report.pdf").await.unwrap();
        assert_eq!(&download.body[..], b"contents of report.pdf");

        let removal = proxy.delete("report.pdf").await.unwrap();
        assert_eq!(&removal.body[..], b"deleted report.pdf");
    }

    #[tokio::test]
    async fn test_unreachable_leader_is_a_transport_error() {
        let proxy = proxy_for(state_with_leader(Some("127.0.0.1:1")).await);
        let err = proxy.list().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {}", err);
    }
}
