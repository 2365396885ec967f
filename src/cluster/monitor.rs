//! Health Monitor
//!
//! Probes every registered node's liveness endpoint and produces a
//! complete snapshot per round. Probes run concurrently and each node's
//! failure is absorbed in isolation; the snapshot always carries exactly
//! one entry per registered node.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::probe::ProbeClient;
use super::registry::NodeRegistry;

/// Result of one full liveness round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessSnapshot {
    /// When this round completed
    pub probed_at: DateTime<Utc>,
    /// Node address -> alive flag, one entry per registered node
    pub nodes: HashMap<String, bool>,
}

impl LivenessSnapshot {
    /// Alive flag for a node, if it is part of this snapshot
    pub fn is_alive(&self, address: &str) -> Option<bool> {
        self.nodes.get(address).copied()
    }

    /// Number of nodes alive in this round
    pub fn alive_count(&self) -> usize {
        self.nodes.values().filter(|alive| **alive).count()
    }

    /// Number of nodes covered by this round
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot covers no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Periodic liveness prober over the node registry
pub struct HealthMonitor {
    registry: Arc<NodeRegistry>,
    probe: ProbeClient,
    path: String,
    timeout: Duration,
}

impl HealthMonitor {
    /// Create a new health monitor
    pub fn new(
        registry: Arc<NodeRegistry>,
        probe: ProbeClient,
        path: String,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            probe,
            path,
            timeout,
        }
    }

    /// Probe all registered nodes and return the round's snapshot.
    ///
    /// Infallible: transport failures mark the node dead, they never
    /// abort the round or leak out of it.
    pub async fn probe_all(&self) -> LivenessSnapshot {
        let probes = self.registry.nodes().iter().map(|node| {
            let probe = self.probe.clone();
            let path = self.path.clone();
            let address = node.address.clone();
            let bound = self.timeout;
            async move {
                let alive = probe.check(&address, &path, bound).await;
                (address, alive)
            }
        });

        let results = futures::future::join_all(probes).await;

        LivenessSnapshot {
            probed_at: Utc::now(),
            nodes: results.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};

    async fn spawn_node() -> String {
        let app = Router::new().route("/health", get(|| async { "OK" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr.to_string()
    }

    fn monitor_for(addresses: &[String]) -> HealthMonitor {
        HealthMonitor::new(
            Arc::new(NodeRegistry::new(addresses)),
            ProbeClient::new(),
            "/health".to_string(),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_snapshot_has_entry_for_every_node() {
        let up = spawn_node().await;
        let down = "127.0.0.1:1".to_string();
        let addresses = vec![up.clone(), down.clone()];

        let snapshot = monitor_for(&addresses).probe_all().await;

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.nodes.contains_key(&up));
        assert!(snapshot.nodes.contains_key(&down));
    }

    #[tokio::test]
    async fn test_failed_probe_does_not_poison_others() {
        let up = spawn_node().await;
        let down = "127.0.0.1:1".to_string();
        let addresses = vec![down.clone(), up.clone()];

        let snapshot = monitor_for(&addresses).probe_all().await;

        assert_eq!(snapshot.is_alive(&up), Some(true));
        assert_eq!(snapshot.is_alive(&down), Some(false));
        assert_eq!(snapshot.alive_count(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_dead() {
        let app = Router::new().route(
            "/health",
            get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "down") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let snapshot = monitor_for(&[addr.clone()]).probe_all().await;
        assert_eq!(snapshot.is_alive(&addr), Some(false));
    }
}
