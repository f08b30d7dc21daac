//! Ego controller
//!
//! The state machine driving the ego vehicle:
//! INIT -> ROUTING -> DRIVING -> {ARRIVED | FAILED}.
//!
//! The DRIVING loop is the tick/sensor synchronization core: one tick is
//! issued, then the loop blocks until that tick's sensor data is confirmed
//! delivered before any control is computed.

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    ActorId, ActorRole, FrameSink, Location, NavigationAgent, Rotation, SimError, Transform,
};
use rand::seq::SliceRandom;
use rand::thread_rng;
use sim_client::{SimulationBackend, SimulationClock, TrafficManager};
use tracing::{debug, info, trace};

use crate::bridge::SensorBridge;
use crate::error::{Result, RunError};
use crate::registry::ActorRegistry;
use crate::spawn_points::SpawnPointPool;

/// Camera mount pose relative to the ego vehicle
const CAMERA_MOUNT: Transform = Transform {
    location: Location {
        x: -5.0,
        y: 0.0,
        z: 2.0,
    },
    rotation: Rotation {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    },
};

/// Spectator altitude above the ego, meters
const SPECTATOR_HEIGHT: f64 = 40.0;

/// Ego state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgoState {
    /// Spawn ego vehicle and sensor, subscribe the sensor
    Init,
    /// Materialize the spawn and route to a destination
    Routing,
    /// Tick, await sensor data, apply control; repeats until terminal
    Driving,
    /// Route exhausted; the run succeeded
    Arrived,
    /// A fatal error terminated the loop
    Failed,
}

/// Controller for the single ego vehicle
pub struct EgoController<B, A> {
    backend: B,
    agent: A,
    bridge: SensorBridge,
    sink: Arc<dyn FrameSink>,
    frame_timeout: Duration,
    state: EgoState,
    vehicle: Option<ActorId>,
    ticks: u64,
    frames_consumed: u64,
}

impl<B: SimulationBackend, A: NavigationAgent> EgoController<B, A> {
    /// Create a controller; nothing is spawned until `run`
    pub fn new(
        backend: B,
        agent: A,
        bridge: SensorBridge,
        sink: Arc<dyn FrameSink>,
        frame_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            agent,
            bridge,
            sink,
            frame_timeout,
            state: EgoState::Init,
            vehicle: None,
            ticks: 0,
            frames_consumed: 0,
        }
    }

    /// Current state machine state
    pub fn state(&self) -> EgoState {
        self.state
    }

    /// Ticks issued during DRIVING
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Frames consumed at the synchronization barrier
    pub fn frames_consumed(&self) -> u64 {
        self.frames_consumed
    }

    /// Drive the state machine to a terminal state
    ///
    /// Any failure transitions to FAILED and propagates; the caller is
    /// responsible for running teardown afterwards on both outcomes.
    pub async fn run<T: TrafficManager>(
        &mut self,
        clock: &mut SimulationClock<B, T>,
        registry: &mut ActorRegistry,
        pool: &mut SpawnPointPool,
    ) -> Result<()> {
        loop {
            let next = match self.state {
                EgoState::Init => self.init(registry, pool).await.map(|()| EgoState::Routing),
                EgoState::Routing => self.route(clock).await.map(|()| EgoState::Driving),
                EgoState::Driving => self.drive_step(clock, registry).await.map(|arrived| {
                    if arrived {
                        EgoState::Arrived
                    } else {
                        EgoState::Driving
                    }
                }),
                EgoState::Arrived => return Ok(()),
                EgoState::Failed => return Err(RunError::AlreadyTerminated),
            };

            match next {
                Ok(state) => {
                    if state != self.state {
                        debug!(from = ?self.state, to = ?state, "ego state transition");
                    }
                    self.state = state;
                    if state == EgoState::Arrived {
                        info!(
                            ticks = self.ticks,
                            "success, arrived at target point"
                        );
                    }
                }
                Err(e) => {
                    self.state = EgoState::Failed;
                    return Err(e);
                }
            }
        }
    }

    /// INIT: spawn ego vehicle and camera, register both, subscribe
    async fn init(&mut self, registry: &mut ActorRegistry, pool: &mut SpawnPointPool) -> Result<()> {
        let blueprints = self.backend.vehicle_blueprints().await?;
        let blueprint = blueprints
            .choose(&mut thread_rng())
            .ok_or_else(|| SimError::command("vehicle_blueprints", "blueprint library is empty"))?;
        let point = pool
            .take()
            .ok_or_else(|| SimError::command("spawn_points", "no spawn point left for the ego"))?;

        let vehicle = self.backend.spawn_actor(&blueprint.id, point, None).await?;
        registry.register(vehicle, ActorRole::Vehicle, &blueprint.id);
        info!(actor_id = vehicle, "created {}", blueprint.id);

        let camera = self
            .backend
            .spawn_actor("sensor.camera.rgb", CAMERA_MOUNT, Some(vehicle))
            .await?;
        registry.register(camera, ActorRole::Sensor, "sensor.camera.rgb");
        info!(actor_id = camera, "created sensor.camera.rgb");

        let source = self
            .backend
            .sensor_source(camera, "camera".to_string())
            .ok_or(SimError::ActorNotFound { actor_id: camera })?;
        self.bridge.subscribe(source.as_ref(), self.sink.clone());

        self.vehicle = Some(vehicle);
        Ok(())
    }

    /// ROUTING: tick once so the spawn materializes, then pick a destination
    async fn route<T: TrafficManager>(&mut self, clock: &mut SimulationClock<B, T>) -> Result<()> {
        let vehicle = self.vehicle()?;

        clock.tick().await?;

        let mut candidates = self.backend.spawn_points().await?;
        candidates.shuffle(&mut thread_rng());
        let current = self.backend.actor_location(vehicle).await?;

        let destination = choose_destination(&candidates, current)
            .ok_or_else(|| SimError::command("spawn_points", "no destination candidate"))?;

        info!(from = ?current, to = ?destination, "routing ego vehicle");
        self.agent.set_destination(destination);
        Ok(())
    }

    /// One DRIVING iteration; Ok(true) once the route is exhausted
    async fn drive_step<T: TrafficManager>(
        &mut self,
        clock: &mut SimulationClock<B, T>,
        registry: &mut ActorRegistry,
    ) -> Result<bool> {
        let vehicle = self.vehicle()?;

        self.agent.update_information();

        clock.tick().await?;
        self.ticks += 1;

        // synchronization barrier: no control before this tick's data landed
        let frame = self.bridge.await_frame(self.frame_timeout).await?;
        self.frames_consumed += 1;
        trace!(frame_id = frame.frame_id, "sensor barrier passed");

        if self.agent.remaining_waypoints() < 1 {
            return Ok(true);
        }

        // non-critical: a failed spectator move never aborts the drive
        if let Err(e) = self.follow_with_spectator(vehicle, registry).await {
            debug!(error = %e, "spectator follow skipped");
        }

        let limit = self.backend.speed_limit(vehicle).await?;
        self.agent.set_target_speed(limit);

        let control = self.agent.run_step();
        self.backend.apply_control(vehicle, &control).await?;

        Ok(false)
    }

    /// Top-down observer camera above the ego
    async fn follow_with_spectator(
        &mut self,
        vehicle: ActorId,
        registry: &mut ActorRegistry,
    ) -> Result<()> {
        let spectator = self.backend.spectator().await?;
        registry.register(spectator, ActorRole::Spectator, "spectator");

        let location = self.backend.actor_location(vehicle).await?;
        self.backend
            .set_actor_transform(
                spectator,
                Transform {
                    location: Location {
                        z: location.z + SPECTATOR_HEIGHT,
                        ..location
                    },
                    rotation: Rotation {
                        pitch: -90.0,
                        yaw: 0.0,
                        roll: 0.0,
                    },
                },
            )
            .await?;
        Ok(())
    }

    fn vehicle(&self) -> Result<ActorId> {
        self.vehicle
            .ok_or_else(|| SimError::command("ego", "vehicle not spawned").into())
    }
}

/// Destination tie-break rule
///
/// The first candidate wins unless it equals the vehicle's current location,
/// in which case the second candidate is used instead.
pub fn choose_destination(candidates: &[Transform], current: Location) -> Option<Location> {
    let first = candidates.first()?;
    if first.location == current {
        candidates.get(1).map(|t| t.location)
    } else {
        Some(first.location)
    }
}
