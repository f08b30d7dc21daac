//! Teardown manager
//!
//! Unconditional cleanup executed once the ego controller reaches a terminal
//! state, on the success and failure paths alike: restore the stepping mode,
//! then drain the actor registry. Safe to run more than once.

use sim_client::{SimulationBackend, SimulationClock, TrafficManager};
use tracing::info;

use crate::registry::ActorRegistry;

/// Owner of the post-run cleanup sequence
pub struct TeardownManager<B, T> {
    clock: SimulationClock<B, T>,
    registry: ActorRegistry,
}

impl<B: SimulationBackend, T: TrafficManager> TeardownManager<B, T> {
    /// Take ownership of the clock and registry for cleanup
    pub fn new(clock: SimulationClock<B, T>, registry: ActorRegistry) -> Self {
        Self { clock, registry }
    }

    /// Restore the clock, destroy every tracked actor, report completion
    ///
    /// Idempotent: the clock restore is a no-op once done and the registry is
    /// empty after the first pass. Returns how many destroys succeeded.
    pub async fn execute(&mut self, backend: &B) -> usize {
        self.clock.exit_sync_mode().await;
        let destroyed = self.registry.destroy_all(backend).await;
        info!(destroyed, "teardown done");
        destroyed
    }
}
