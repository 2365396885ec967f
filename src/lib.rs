//! WolfGate - Cluster Coordination Gateway
//!
//! A small coordination layer that sits in front of a cluster of storage
//! nodes: it tracks which nodes are alive, discovers which node currently
//! acts as leader, and keeps Lamport logical clocks for a fixed set of
//! participants. Consumers read the gateway's view over an HTTP API, and
//! file operations are relayed to whichever node the last discovery round
//! confirmed as leader.
//!
//! # Architecture
//!
//! WolfGate observes, it never elects. A scheduler drives two independent
//! fixed-delay loops: one polls every node's liveness and scans for the
//! leader in priority order, the other advances the logical clocks. Both
//! write into a shared, read-mostly coordination state that the API layer
//! serves without blocking on probes.
//!
//! # Features
//!
//! - Concurrent per-node liveness probing with bounded timeouts
//! - Priority-order leader discovery with an identity consistency check
//! - Lamport clocks with tick and message-merge operations
//! - Leader-routed file relay (upload, download, delete, stats)
//! - HTTP API and an operator CLI (`wolfgatectl`)

pub mod api;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod error;
pub mod files;
pub mod scheduler;
pub mod state;

pub use config::WolfGateConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{ClockState, LamportClocks};
    pub use crate::cluster::{
        HealthMonitor, LeaderInfo, LeaderLocator, LivenessSnapshot, Node, NodeRegistry,
        ProbeClient,
    };
    pub use crate::config::WolfGateConfig;
    pub use crate::error::{Error, Result};
    pub use crate::scheduler::Coordinator;
    pub use crate::state::CoordinationState;
}
