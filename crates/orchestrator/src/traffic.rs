//! Background traffic population
//!
//! Bulk-spawns autonomous vehicles and configures their behavior through the
//! traffic manager. Per-vehicle spawn failures are the one tolerated failure
//! class: they are logged and skipped, and the run continues with whatever
//! subset spawned.

use contracts::{ActorId, ActorRole, VehicleBehaviorProfile, REQUIRED_WHEEL_COUNT};
use rand::seq::SliceRandom;
use rand::thread_rng;
use sim_client::{SimulationBackend, TrafficManager};
use tracing::{info, warn};

use crate::error::Result;
use crate::registry::ActorRegistry;
use crate::spawn_points::SpawnPointPool;

/// Spawner and behavior configurator for non-ego vehicles
pub struct TrafficPopulation<B, T> {
    backend: B,
    traffic_manager: T,
}

impl<B: SimulationBackend, T: TrafficManager> TrafficPopulation<B, T> {
    /// Create a population manager
    pub fn new(backend: B, traffic_manager: T) -> Self {
        Self {
            backend,
            traffic_manager,
        }
    }

    /// Attempt `n` background spawns, each on a distinct spawn point
    ///
    /// Candidates are filtered to the fixed wheel count and chosen at random
    /// per attempt. Returns the vehicles actually spawned (0..n); each is
    /// registered and has autopilot enabled before this returns.
    pub async fn spawn_background_vehicles(
        &self,
        n: usize,
        pool: &mut SpawnPointPool,
        registry: &mut ActorRegistry,
    ) -> Result<Vec<ActorId>> {
        let candidates: Vec<_> = self
            .backend
            .vehicle_blueprints()
            .await?
            .into_iter()
            .filter(|bp| bp.wheels == REQUIRED_WHEEL_COUNT)
            .collect();

        if candidates.is_empty() {
            warn!("no vehicle blueprints with {REQUIRED_WHEEL_COUNT} wheels; nothing to spawn");
            return Ok(Vec::new());
        }

        let tm_port = self.traffic_manager.port();
        let mut vehicles = Vec::with_capacity(n);

        for _ in 0..n {
            let Some(point) = pool.take() else {
                warn!(spawned = vehicles.len(), requested = n, "spawn points exhausted");
                break;
            };
            let Some(blueprint) = candidates.choose(&mut thread_rng()) else {
                break;
            };

            // a failed attempt keeps its point consumed
            match self.backend.spawn_actor(&blueprint.id, point, None).await {
                Ok(vehicle) => {
                    registry.register(vehicle, ActorRole::Vehicle, &blueprint.id);
                    self.backend.set_autopilot(vehicle, true, tm_port).await?;
                    info!(actor_id = vehicle, "created {}", blueprint.id);
                    vehicles.push(vehicle);
                }
                Err(e) => {
                    warn!(blueprint = %blueprint.id, error = %e, "background spawn failed, skipping");
                }
            }
        }

        info!(
            spawned = vehicles.len(),
            requested = n,
            "background traffic populated"
        );
        Ok(vehicles)
    }

    /// Apply a behavior profile to one vehicle
    pub async fn apply_behavior(
        &self,
        vehicle: ActorId,
        profile: &VehicleBehaviorProfile,
    ) -> Result<()> {
        self.traffic_manager
            .ignore_lights_percentage(vehicle, profile.ignore_lights_pct)
            .await?;
        self.traffic_manager
            .distance_to_leading_vehicle(vehicle, profile.min_follow_distance_m)
            .await?;
        self.traffic_manager
            .vehicle_speed_difference(vehicle, profile.speed_delta_pct)
            .await?;
        Ok(())
    }

    /// One-shot population-wide speed difference
    pub async fn apply_global_speed_difference(&self, pct: f64) -> Result<()> {
        self.traffic_manager.set_global_speed_difference(pct).await?;
        Ok(())
    }
}
