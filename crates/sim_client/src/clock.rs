//! Simulation clock
//!
//! Owns the switch into synchronous fixed-step mode and its restoration.
//! `enter_sync_mode` captures the backend's prior settings; `exit_sync_mode`
//! restores them and is safe to call on every exit path, any number of times.

use contracts::{Result, WorldSettings};
use tracing::{info, warn};

use crate::client::{SimulationBackend, TrafficManager};

/// Fixed-step clock over a backend and its traffic manager
pub struct SimulationClock<B, T> {
    backend: B,
    traffic_manager: T,
    prior: Option<WorldSettings>,
}

impl<B: SimulationBackend, T: TrafficManager> SimulationClock<B, T> {
    /// Create a clock; no mode change happens until `enter_sync_mode`
    pub fn new(backend: B, traffic_manager: T) -> Self {
        Self {
            backend,
            traffic_manager,
            prior: None,
        }
    }

    /// Switch the backend to synchronous fixed-step mode
    ///
    /// Captures the current settings first so `exit_sync_mode` can restore
    /// them. Also enables traffic-manager synchronous mode, which must follow
    /// the world's stepping mode.
    pub async fn enter_sync_mode(&mut self, step_seconds: f64) -> Result<()> {
        let prior = self.backend.world_settings().await?;
        self.backend
            .apply_settings(WorldSettings {
                synchronous_mode: true,
                fixed_delta_seconds: Some(step_seconds),
            })
            .await?;
        self.traffic_manager.set_sync_mode(true).await?;
        self.prior = Some(prior);
        info!(step_seconds, "entered synchronous mode");
        Ok(())
    }

    /// Restore the settings captured by `enter_sync_mode`
    ///
    /// No-op when nothing was captured, so repeated calls and calls on the
    /// failure path are safe. Restoration failures are logged, not raised:
    /// teardown must keep going.
    pub async fn exit_sync_mode(&mut self) {
        let Some(prior) = self.prior.take() else {
            return;
        };
        if let Err(e) = self.backend.apply_settings(prior).await {
            warn!(error = %e, "failed to restore world settings");
        }
        if let Err(e) = self.traffic_manager.set_sync_mode(false).await {
            warn!(error = %e, "failed to restore traffic manager mode");
        }
        info!("restored pre-run stepping mode");
    }

    /// Advance the simulation one fixed step
    ///
    /// Blocks until the backend acknowledges. Fatal on error; the caller
    /// aborts to teardown without retry.
    pub async fn tick(&self) -> Result<u64> {
        self.backend.tick().await
    }

    /// Whether sync mode is currently held
    pub fn in_sync_mode(&self) -> bool {
        self.prior.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock_client::{MockBackend, MockTrafficManager};

    async fn clock() -> (MockBackend, MockTrafficManager, SimulationClock<MockBackend, MockTrafficManager>) {
        let mut backend = MockBackend::new();
        backend
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        let tm = MockTrafficManager::new(8000);
        let clock = SimulationClock::new(backend.clone(), tm.clone());
        (backend, tm, clock)
    }

    #[tokio::test]
    async fn enter_then_exit_restores_prior_settings() {
        let (backend, tm, mut clock) = clock().await;
        let before = backend.current_settings();
        assert!(!before.synchronous_mode);

        clock.enter_sync_mode(0.05).await.unwrap();
        assert!(clock.in_sync_mode());
        assert!(backend.current_settings().synchronous_mode);
        assert_eq!(backend.current_settings().fixed_delta_seconds, Some(0.05));
        assert!(tm.is_sync_mode());

        clock.exit_sync_mode().await;
        assert_eq!(backend.current_settings(), before);
        assert!(!tm.is_sync_mode());
    }

    #[tokio::test]
    async fn exit_without_enter_is_a_noop() {
        let (backend, _tm, mut clock) = clock().await;
        let before = backend.current_settings();
        clock.exit_sync_mode().await;
        clock.exit_sync_mode().await;
        assert_eq!(backend.current_settings(), before);
    }

    #[tokio::test]
    async fn tick_advances_the_frame_counter() {
        let (_backend, _tm, mut clock) = clock().await;
        clock.enter_sync_mode(0.05).await.unwrap();
        assert_eq!(clock.tick().await.unwrap(), 1);
        assert_eq!(clock.tick().await.unwrap(), 2);
    }
}
