//! Cluster observation
//!
//! The registry of known nodes plus the two probing components built on
//! it: the health monitor (liveness snapshots) and the leader locator
//! (priority-order discovery).

pub mod locator;
pub mod monitor;
pub mod probe;
pub mod registry;

pub use locator::{LeaderInfo, LeaderLocator};
pub use monitor::{HealthMonitor, LivenessSnapshot};
pub use probe::ProbeClient;
pub use registry::{Node, NodeRegistry};
