//! Actor registry
//!
//! Tracks every created actor so teardown can destroy exactly the live set.
//! Every actor is registered before any operation that can fail, keeping the
//! tracked set equal to the set that must be destroyed.

use contracts::{ActorId, ActorRole};
use sim_client::SimulationBackend;
use tracing::{debug, error, info};

/// One tracked actor
#[derive(Debug, Clone)]
pub struct RegisteredActor {
    pub id: ActorId,
    pub role: ActorRole,
    pub label: String,
}

/// Registry of owned actors
///
/// An actor is owned by exactly one registry from creation to destruction.
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: Vec<RegisteredActor>,
}

impl ActorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record ownership of an actor
    ///
    /// Re-registering an already tracked id is a logged no-op.
    pub fn register(&mut self, id: ActorId, role: ActorRole, label: impl Into<String>) {
        if self.actors.iter().any(|a| a.id == id) {
            debug!(actor_id = id, "actor already registered");
            return;
        }
        self.actors.push(RegisteredActor {
            id,
            role,
            label: label.into(),
        });
    }

    /// Number of tracked actors
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether the registry tracks nothing
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Ids currently tracked
    pub fn tracked_ids(&self) -> Vec<ActorId> {
        self.actors.iter().map(|a| a.id).collect()
    }

    /// Destroy every tracked actor, best effort
    ///
    /// One batched backend call, sensors ordered first, then vehicles, then
    /// the spectator. Individual failures are logged and skipped; the set is
    /// cleared either way, so a second call is a no-op. Returns how many
    /// destroys succeeded.
    pub async fn destroy_all<B: SimulationBackend>(&mut self, backend: &B) -> usize {
        if self.actors.is_empty() {
            return 0;
        }

        info!(count = self.actors.len(), "destroying actors");

        let mut ordered: Vec<&RegisteredActor> = Vec::with_capacity(self.actors.len());
        for role in [ActorRole::Sensor, ActorRole::Vehicle, ActorRole::Spectator] {
            ordered.extend(self.actors.iter().filter(|a| a.role == role));
        }
        let ids: Vec<ActorId> = ordered.iter().map(|a| a.id).collect();

        let mut destroyed = 0;
        for (actor, result) in ordered.iter().zip(backend.destroy_actors(&ids).await) {
            match result {
                Ok(()) => destroyed += 1,
                Err(e) => {
                    error!(actor_id = actor.id, label = %actor.label, error = %e, "failed to destroy actor");
                }
            }
        }

        self.actors.clear();
        destroyed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use sim_client::{MockBackend, MockConfig};

    async fn backend_with(config: MockConfig) -> MockBackend {
        let mut backend = MockBackend::with_config(config);
        backend
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn destroy_all_empties_the_registry() {
        let backend = backend_with(MockConfig::default()).await;
        let vehicle = backend
            .spawn_actor("vehicle.tesla.model3", contracts::Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();
        let camera = backend
            .spawn_actor(
                "sensor.camera.rgb",
                contracts::Transform::at(-5.0, 0.0, 2.0),
                Some(vehicle),
            )
            .await
            .unwrap();

        let mut registry = ActorRegistry::new();
        registry.register(vehicle, ActorRole::Vehicle, "vehicle.tesla.model3");
        registry.register(camera, ActorRole::Sensor, "sensor.camera.rgb");

        let destroyed = registry.destroy_all(&backend).await;
        assert_eq!(destroyed, 2);
        assert!(registry.is_empty());
        assert_eq!(backend.actor_count(), 0);
        assert_eq!(backend.destroy_calls(vehicle), 1);
        assert_eq!(backend.destroy_calls(camera), 1);
    }

    #[tokio::test]
    async fn second_destroy_all_is_a_noop() {
        let backend = backend_with(MockConfig::default()).await;
        let vehicle = backend
            .spawn_actor("vehicle.audi.tt", contracts::Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();

        let mut registry = ActorRegistry::new();
        registry.register(vehicle, ActorRole::Vehicle, "vehicle.audi.tt");

        registry.destroy_all(&backend).await;
        let destroyed_again = registry.destroy_all(&backend).await;

        assert_eq!(destroyed_again, 0);
        // exactly one destroy call ever reached the backend
        assert_eq!(backend.destroy_calls(vehicle), 1);
    }

    #[tokio::test]
    async fn individual_destroy_failures_are_skipped() {
        let backend = backend_with(MockConfig {
            fail_destroy: vec![1000],
            ..Default::default()
        })
        .await;
        let a = backend
            .spawn_actor("vehicle.audi.tt", contracts::Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();
        let b = backend
            .spawn_actor("vehicle.mini.cooper", contracts::Transform::at(10.0, 0.0, 0.3), None)
            .await
            .unwrap();
        assert_eq!(a, 1000);

        let mut registry = ActorRegistry::new();
        registry.register(a, ActorRole::Vehicle, "vehicle.audi.tt");
        registry.register(b, ActorRole::Vehicle, "vehicle.mini.cooper");

        let destroyed = registry.destroy_all(&backend).await;
        assert_eq!(destroyed, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut registry = ActorRegistry::new();
        registry.register(7, ActorRole::Spectator, "spectator");
        registry.register(7, ActorRole::Spectator, "spectator");
        assert_eq!(registry.len(), 1);
    }
}
