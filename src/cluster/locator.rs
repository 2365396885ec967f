//! Leader Locator
//!
//! Discovers the cluster's current leader by asking registered nodes in
//! priority order. A node's answer only counts when the reported identity
//! text names the node itself; otherwise the scan keeps the reported name
//! as provisional and moves on. Every round starts from scratch.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::probe::ProbeClient;
use super::registry::NodeRegistry;

/// Outcome of one leader discovery round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderInfo {
    /// Identity text reported by the cluster, if any node answered
    pub name: Option<String>,
    /// Address of the node whose answer named itself
    pub address: Option<String>,
}

impl LeaderInfo {
    /// The state before any round has succeeded
    pub fn unknown() -> Self {
        Self {
            name: None,
            address: None,
        }
    }

    /// Whether a reachable node confirmed itself as leader
    pub fn is_known(&self) -> bool {
        self.address.is_some()
    }
}

/// Priority-order leader discovery over the node registry
pub struct LeaderLocator {
    registry: Arc<NodeRegistry>,
    probe: ProbeClient,
    path: String,
    timeout: Duration,
}

impl LeaderLocator {
    /// Create a new leader locator
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

    /// Run one discovery round.
    ///
    /// Scans nodes in registry order and stops at the first node whose
    /// reported identity text contains its own identity fragment. A
    /// mismatched answer records the reported name without an address and
    /// the scan continues. If no node confirms, the result is whatever
    /// provisional name was seen last, with no address.
    pub async fn locate(&self) -> LeaderInfo {
        let mut info = LeaderInfo::unknown();

        for node in self.registry.nodes() {
            let text = match self
                .probe
                .get_text(&node.address, &self.path, self.timeout)
                .await
            {
                Ok(text) => text,
                Err(err) => {
                    debug!("leader probe to {} failed: {}", node.address, err);
                    continue;
                }
            };

            let reported = text.trim();
            if reported.is_empty() {
                continue;
            }

            if reported.contains(node.identity_fragment()) {
                info.name = Some(reported.to_string());
                info.address = Some(node.address.clone());
                break;
            }

            // Answer names some other node: believable but unconfirmed
            debug!(
                "node {} reported leader '{}' which is not itself",
                node.address, reported
            );
            info.name = Some(reported.to_string());
        }

        info
    }
}
