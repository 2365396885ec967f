//! Shared coordination state
//!
//! Everything the background rounds produce and the API layer reads:
//! the latest liveness snapshot, the latest leader discovery outcome,
//! and the logical clocks. Owned and injectable so tests can run several
//! independent instances side by side.

use tokio::sync::RwLock;

use crate::clock::LamportClocks;
use crate::cluster::{LeaderInfo, LivenessSnapshot};

/// Read-mostly state written by the scheduler's rounds
pub struct CoordinationState {
    liveness: RwLock<Option<LivenessSnapshot>>,
    leader: RwLock<LeaderInfo>,
    clocks: LamportClocks,
}

impl CoordinationState {
    /// Fresh state: no liveness round yet, leader unknown, clocks at zero
    pub fn new(participants: &[String]) -> Self {
        Self {
            liveness: RwLock::new(None),
            leader: RwLock::new(LeaderInfo::unknown()),
            clocks: LamportClocks::new(participants),
        }
    }

    /// Latest liveness snapshot, or None before the first round completes
    pub async fn liveness(&self) -> Option<LivenessSnapshot> {
        self.liveness.read().await.clone()
    }

    /// Replace the liveness snapshot wholesale with this round's result
    pub async fn publish_liveness(&self, snapshot: LivenessSnapshot) {
        let mut liveness = self.liveness.write().await;
        *liveness = Some(snapshot);
    }

    /// Latest leader discovery outcome
    pub async fn leader(&self) -> LeaderInfo {
        self.leader.read().await.clone()
    }

    /// Replace the leader outcome with this round's result.
    ///
    /// Returns true when the outcome differs from the previous round.
    pub async fn publish_leader(&self, info: LeaderInfo) -> bool {
        let mut leader = self.leader.write().await;
        let changed = *leader != info;
        *leader = info;
        changed
    }

    /// The logical clocks
    pub fn clocks(&self) -> &LamportClocks {
        &self.clocks
    }
}
