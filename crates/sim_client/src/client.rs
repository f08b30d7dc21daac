//! Simulation backend abstraction
//!
//! Traits for interacting with the simulator, supporting a real binding and
//! mock testing behind one interface.

use std::future::Future;
use std::time::Duration;

use contracts::{
    ActorId, Location, Result, SensorSource, Transform, VehicleBlueprint, VehicleControl,
    WeatherParams, WorldSettings,
};

/// Simulation backend trait
///
/// Abstracts the simulator's client surface so the orchestration core can run
/// against a real server or a mock interchangeably.
pub trait SimulationBackend: Send + Sync {
    /// Connect to the simulation server
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Read the current world stepping settings
    fn world_settings(&self) -> impl Future<Output = Result<WorldSettings>> + Send;

    /// Apply world stepping settings
    fn apply_settings(&self, settings: WorldSettings) -> impl Future<Output = Result<()>> + Send;

    /// List the vehicle blueprint library
    fn vehicle_blueprints(&self) -> impl Future<Output = Result<Vec<VehicleBlueprint>>> + Send;

    /// Recommended spawn points for the current map
    fn spawn_points(&self) -> impl Future<Output = Result<Vec<Transform>>> + Send;

    /// Spawn an actor
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g. "vehicle.tesla.model3"
    /// * `transform` - Initial pose; relative to the parent when attaching
    /// * `attach_to` - Optional parent actor
    fn spawn_actor(
        &self,
        blueprint: &str,
        transform: Transform,
        attach_to: Option<ActorId>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Destroy an actor
    ///
    /// Idempotent: returns Ok if the actor no longer exists.
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Destroy a batch of actors, one result per id in order
    ///
    /// Never short-circuits: every id gets a destroy attempt.
    fn destroy_actors(
        &self,
        actor_ids: &[ActorId],
    ) -> impl Future<Output = Vec<Result<()>>> + Send {
        async move {
            let mut results = Vec::with_capacity(actor_ids.len());
            for &actor_id in actor_ids {
                results.push(self.destroy_actor(actor_id).await);
            }
            results
        }
    }

    /// Set the world weather
    fn set_weather(&self, weather: WeatherParams) -> impl Future<Output = Result<()>> + Send;

    /// Advance the simulation by one fixed step
    ///
    /// Blocks until the backend acknowledges the step; returns the new frame
    /// number. Failure here is fatal and is never retried.
    fn tick(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Current location of an actor
    fn actor_location(&self, actor_id: ActorId) -> impl Future<Output = Result<Location>> + Send;

    /// Handle of the observer camera actor
    fn spectator(&self) -> impl Future<Output = Result<ActorId>> + Send;

    /// Move an actor to a new pose
    fn set_actor_transform(
        &self,
        actor_id: ActorId,
        transform: Transform,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Speed limit currently applying to a vehicle, km/h
    fn speed_limit(&self, actor_id: ActorId) -> impl Future<Output = Result<f64>> + Send;

    /// Apply one control command to a vehicle
    fn apply_control(
        &self,
        actor_id: ActorId,
        control: &VehicleControl,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Enable or disable autopilot, bound to a traffic-manager port
    fn set_autopilot(
        &self,
        actor_id: ActorId,
        enabled: bool,
        tm_port: u16,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get the data source for a spawned sensor
    ///
    /// Returns a boxed `SensorSource` usable by the sensor bridge, or None if
    /// the actor does not exist.
    fn sensor_source(&self, actor_id: ActorId, name: String) -> Option<Box<dyn SensorSource>>;
}

/// Traffic manager trait
///
/// Governs autopilot behavior of non-ego vehicles; bound to the backend.
pub trait TrafficManager: Send + Sync {
    /// Toggle traffic-manager synchronous mode
    fn set_sync_mode(&self, enabled: bool) -> impl Future<Output = Result<()>> + Send;

    /// Population-wide speed difference vs. the speed limit, percent
    fn set_global_speed_difference(&self, pct: f64) -> impl Future<Output = Result<()>> + Send;

    /// Per-vehicle probability of ignoring traffic lights, percent
    fn ignore_lights_percentage(
        &self,
        vehicle: ActorId,
        pct: f64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Per-vehicle minimum following distance, meters
    fn distance_to_leading_vehicle(
        &self,
        vehicle: ActorId,
        meters: f64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Per-vehicle speed difference vs. the speed limit, percent
    fn vehicle_speed_difference(
        &self,
        vehicle: ActorId,
        pct: f64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Port this traffic manager is bound to
    fn port(&self) -> u16;
}
