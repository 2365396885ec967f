//! Node Registry
//!
//! Fixed, ordered list of storage node addresses. List position doubles
//! as discovery priority: the Leader Locator scans nodes in this order.

use serde::{Deserialize, Serialize};

/// A single registered storage node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Routable address (host:port)
    pub address: String,
    /// Position in the registry (lower = higher discovery priority)
    pub priority: usize,
}

impl Node {
    /// Create a new node
    pub fn new(address: String, priority: usize) -> Self {
        Self { address, priority }
    }

    /// The substring of the address that a leader-identity payload must
    /// contain for this node's leader claim to be trusted.
    ///
    /// For `host:port` forms this is the port segment; addresses without
    /// a port fall back to the full address.
    pub fn identity_fragment(&self) -> &str {
        match self.address.rsplit_once(':') {
            Some((_, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
                port
            }
            _ => &self.address,
        }
    }
}

/// Ordered registry of candidate nodes, fixed at configuration time
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
}

impl NodeRegistry {
    /// Build a registry from an ordered address list
    pub fn new(addresses: &[String]) -> Self {
        let nodes = addresses
            .iter()
            .enumerate()
            .map(|(priority, address)| Node::new(address.clone(), priority))
            .collect();

        Self { nodes }
    }

    /// All nodes in priority order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by address
    pub fn get(&self, address: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.address == address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_preserves_order() {
        let addresses = vec![
            "127.0.0.1:8001".to_string(),
            "127.0.0.1:8002".to_string(),
            "127.0.0.1:8003".to_string(),
        ];
        let registry = NodeRegistry::new(&addresses);

        assert_eq!(registry.len(), 3);
        for (i, node) in registry.nodes().iter().enumerate() {
            assert_eq!(node.priority, i);
            assert_eq!(node.address, addresses[i]);
        }
    }

    #[test]
    fn test_identity_fragment() {
        let node = Node::new("127.0.0.1:8001".to_string(), 0);
        assert_eq!(node.identity_fragment(), "8001");

        let node = Node::new("storage-1.internal:9000".to_string(), 1);
        assert_eq!(node.identity_fragment(), "9000");

        // No port: the whole address is the fragment
        let node = Node::new("storage-1".to_string(), 2);
        assert_eq!(node.identity_fragment(), "storage-1");

        // IPv6 with port
        let node = Node::new("[::1]:8002".to_string(), 3);
        assert_eq!(node.identity_fragment(), "8002");
    }

    #[test]
    fn test_get_by_address() {
        let registry = NodeRegistry::new(&["127.0.0.1:8001".to_string()]);
        assert!(registry.get("127.0.0.1:8001").is_some());
        assert!(registry.get("127.0.0.1:9999").is_none());
    }
}
