//! Lamport logical clocks
//!
//! One counter per participant from a fixed set known at startup.
//! `tick` models a local event, `send` models a message arrival using the
//! standard Lamport merge rule. Counters only ever grow and live for the
//! process lifetime.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Read-only view of all counters, keyed by participant id
pub type ClockState = BTreeMap<String, u64>;

/// Lamport counters for a fixed participant set
pub struct LamportClocks {
    counters: RwLock<BTreeMap<String, u64>>,
}

impl LamportClocks {
    /// Create clocks for the given participants, all starting at zero
    pub fn new(participants: &[String]) -> Self {
        let counters = participants
            .iter()
            .map(|id| (id.clone(), 0))
            .collect();
        Self {
            counters: RwLock::new(counters),
        }
    }

    /// Local event: increment one participant's counter by 1
    pub async fn tick(&self, participant: &str) -> Result<u64> {
        let mut counters = self.counters.write().await;
        let counter = counters
            .get_mut(participant)
            .ok_or_else(|| Error::UnknownParticipant(participant.to_string()))?;
        *counter += 1;
        Ok(*counter)
    }

    /// Local event on every participant, one write guard for the round
    pub async fn tick_all(&self) {
        let mut counters = self.counters.write().await;
        for counter in counters.values_mut() {
            *counter += 1;
        }
    }

    /// Message event: the receiver's counter becomes
    /// `max(counter(to), counter(from)) + 1`. The sender is unaffected.
    ///
    /// Both participants are validated before anything is mutated.
    pub async fn send(&self, from: &str, to: &str) -> Result<u64> {
        let mut counters = self.counters.write().await;
        let from_value = *counters
            .get(from)
            .ok_or_else(|| Error::UnknownParticipant(from.to_string()))?;
        let to_counter = counters
            .get_mut(to)
            .ok_or_else(|| Error::UnknownParticipant(to.to_string()))?;
        *to_counter = from_value.max(*to_counter) + 1;
        Ok(*to_counter)
    }

    /// Copy of the current counters
    pub async fn snapshot(&self) -> ClockState {
        self.counters.read().await.clone()
    }
}
