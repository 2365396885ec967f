//! Round scheduler
//!
//! Drives the background work on two independent fixed-delay schedules:
//! one for the cluster poll (liveness round plus leader discovery round)
//! and one for the logical clock tick. Each schedule sleeps after a round
//! completes, so a slow round delays the next one instead of overlapping
//! it. Shutdown interrupts both the rounds and the sleeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cluster::{HealthMonitor, LeaderLocator};
use crate::state::CoordinationState;

/// Owner of the two periodic schedules
pub struct Coordinator {
    monitor: HealthMonitor,
    locator: LeaderLocator,
    state: Arc<CoordinationState>,
    poll_interval: Duration,
    tick_interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl Coordinator {
    /// Create a coordinator over the given components
    pub fn new(
        monitor: HealthMonitor,
        locator: LeaderLocator,
        state: Arc<CoordinationState>,
        poll_interval: Duration,
        tick_interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            monitor,
            locator,
            state,
            poll_interval,
            tick_interval,
            shutdown: shutdown_tx,
        }
    }

    /// Run both schedules until [`stop`](Self::stop) is called.
    ///
    /// The first round of each schedule runs immediately.
    pub async fn start(&self) {
        info!(
            "coordinator started (poll every {:?}, clock tick every {:?})",
            self.poll_interval, self.tick_interval
        );

        tokio::join!(self.poll_loop(), self.tick_loop());

        info!("coordinator stopped");
    }

    /// Signal both schedules to stop
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    async fn poll_loop(&self) {
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = self.poll_round() => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    }

    async fn tick_loop(&self) {
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            self.state.clocks().tick_all().await;
            tokio::select! {
                _ = tokio::time::sleep(self.tick_interval) => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// One cluster poll: liveness and leader discovery run side by side,
    /// then both results replace the shared state.
    async fn poll_round(&self) {
        let (snapshot, leader) = tokio::join!(self.monitor.probe_all(), self.locator.locate());

        debug!(
            "poll round complete: {}/{} nodes alive",
            snapshot.alive_count(),
            snapshot.len()
        );
        self.state.publish_liveness(snapshot).await;

        let changed = self.state.publish_leader(leader.clone()).await;
        if changed {
            match (&leader.name, &leader.address) {
                (Some(name), Some(address)) => {
                    info!("leader is now '{}' at {}", name, address)
                }
                (Some(name), None) => {
                    warn!("leader reported as '{}' but no node confirmed itself", name)
                }
                _ => warn!("leader unknown: no node answered the discovery round"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{NodeRegistry, ProbeClient};
    use axum::extract::State;
    use axum::{routing::get, Router};

    async fn leader_reply(State(reply): State<String>) -> String {
        reply
    }

    /// Node answering /health with OK and /leader with its own port
    async fn spawn_full_node() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/health", get(|| async { "OK" }))
            .route("/leader", get(leader_reply))
            .with_state(format!("Current Leader: {}", addr.port()));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr.to_string()
    }

    fn coordinator_for(
        addresses: &[String],
        poll_interval: Duration,
        tick_interval: Duration,
    ) -> (Arc<CoordinationState>, Arc<Coordinator>) {
        let registry = Arc::new(NodeRegistry::new(addresses));
        let probe = ProbeClient::new();
        let state = Arc::new(CoordinationState::new(&[
            "A".to_string(),
            "B".to_string(),
        ]));
        let monitor = HealthMonitor::new(
            registry.clone(),
            probe.clone(),
            "/health".to_string(),
            Duration::from_millis(300),
        );
        let locator = LeaderLocator::new(
            registry,
            probe,
            "/leader".to_string(),
            Duration::from_millis(300),
        );
        let coordinator = Arc::new(Coordinator::new(
            monitor,
            locator,
            state.clone(),
            poll_interval,
            tick_interval,
        ));
        (state, coordinator)
    }

    #[tokio::test]
    async fn test_rounds_populate_shared_state() {
        let addr = spawn_full_node().await;
        let (state, coordinator) = coordinator_for(
            &[addr.clone()],
            Duration::from_millis(50),
            Duration::from_millis(50),
        );

        let runner = coordinator.clone();
        let task = tokio::spawn(async move { runner.start().await });
        tokio::time::sleep(Duration::from_millis(300)).await;

        let snapshot = state.liveness().await.expect("liveness round ran");
        assert_eq!(snapshot.is_alive(&addr), Some(true));
        assert_eq!(state.leader().await.address, Some(addr));
        assert!(state.clocks().snapshot().await["A"] >= 1);

        coordinator.stop();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("coordinator stopped promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_interrupts_long_sleeps() {
        let (_state, coordinator) = coordinator_for(
            &["127.0.0.1:1".to_string()],
            Duration::from_secs(600),
            Duration::from_secs(600),
        );

        let runner = coordinator.clone();
        let task = tokio::spawn(async move { runner.start().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        coordinator.stop();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("stop cut the sleeps short")
            .unwrap();
    }

    #[tokio::test]
    async fn test_clock_schedule_runs_independently_of_polling() {
        // Polling is stuck on an unreachable node with a huge interval;
        // the clock schedule must keep ticking regardless.
        let (state, coordinator) = coordinator_for(
            &["127.0.0.1:1".to_string()],
            Duration::from_secs(600),
            Duration::from_millis(25),
        );

        let runner = coordinator.clone();
        let task = tokio::spawn(async move { runner.start().await });
        tokio::time::sleep(Duration::from_millis(300)).await;

        let state_now = state.clocks().snapshot().await;
        assert!(state_now["A"] >= 2, "clocks ticked: {:?}", state_now);
        assert!(state_now["B"] >= 2);

        coordinator.stop();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("coordinator stopped promptly")
            .unwrap();
    }
}
