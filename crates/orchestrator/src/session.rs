//! Run session
//!
//! Wires the components into one run: connect, enter sync mode, populate
//! traffic, drive the ego to a terminal state, then tear everything down.
//! Teardown executes on every exit path; the outcome is captured first and
//! returned only after cleanup finished.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    FrameSink, NavigationAgent, VehicleBehaviorProfile, WeatherParams, BACKGROUND_VEHICLE_COUNT,
    FIXED_STEP_SECONDS, GLOBAL_SPEED_DIFFERENCE_PCT, SENSOR_QUEUE_CAPACITY,
};
use sim_client::{SimulationBackend, SimulationClock, TrafficManager};
use tracing::info;

use crate::bridge::SensorBridge;
use crate::ego::{EgoController, EgoState};
use crate::error::Result;
use crate::registry::ActorRegistry;
use crate::spawn_points::SpawnPointPool;
use crate::teardown::TeardownManager;
use crate::traffic::TrafficPopulation;

/// Session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub background_vehicles: usize,
    pub frame_timeout: Duration,
    pub fixed_step_seconds: f64,
    pub global_speed_difference_pct: f64,
    pub profile: VehicleBehaviorProfile,
    pub weather: WeatherParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2000,
            connect_timeout: Duration::from_secs(10),
            background_vehicles: BACKGROUND_VEHICLE_COUNT,
            frame_timeout: Duration::from_secs(10),
            fixed_step_seconds: FIXED_STEP_SECONDS,
            global_speed_difference_pct: GLOBAL_SPEED_DIFFERENCE_PCT,
            profile: VehicleBehaviorProfile::default(),
            weather: WeatherParams::default(),
        }
    }
}

/// What one completed run did
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Whether the ego reached its destination
    pub arrived: bool,
    /// Ticks issued while driving
    pub ticks: u64,
    /// Frames consumed at the synchronization barrier
    pub frames_consumed: u64,
    /// Background vehicles actually spawned
    pub background_vehicles: usize,
    /// Actors destroyed during teardown
    pub actors_destroyed: usize,
    /// Wall time of the whole session
    pub duration: Duration,
}

/// One simulated run, owning every resource it creates
pub struct RunSession<B, T, A> {
    backend: B,
    traffic_manager: T,
    agent: A,
    sink: Arc<dyn FrameSink>,
    config: SessionConfig,
}

impl<B, T, A> RunSession<B, T, A>
where
    B: SimulationBackend + Clone,
    T: TrafficManager + Clone,
    A: NavigationAgent,
{
    /// Create a session
    pub fn new(
        backend: B,
        traffic_manager: T,
        agent: A,
        sink: Arc<dyn FrameSink>,
        config: SessionConfig,
    ) -> Self {
        Self {
            backend,
            traffic_manager,
            agent,
            sink,
            config,
        }
    }

    /// Run to completion
    ///
    /// The drive outcome is captured before teardown; teardown runs
    /// unconditionally, then the outcome is propagated.
    pub async fn run(mut self) -> Result<RunReport> {
        let started = Instant::now();

        info!(
            host = %self.config.host,
            port = self.config.port,
            "connecting to simulation backend"
        );
        self.backend
            .connect(&self.config.host, self.config.port, self.config.connect_timeout)
            .await?;

        let mut clock = SimulationClock::new(self.backend.clone(), self.traffic_manager.clone());
        let mut registry = ActorRegistry::new();

        let outcome = Self::execute(
            &self.backend,
            &self.traffic_manager,
            self.agent,
            self.sink,
            &self.config,
            &mut clock,
            &mut registry,
        )
        .await;

        let mut teardown = TeardownManager::new(clock, registry);
        let actors_destroyed = teardown.execute(&self.backend).await;

        let (ticks, frames_consumed, background_vehicles, arrived) = outcome?;
        Ok(RunReport {
            arrived,
            ticks,
            frames_consumed,
            background_vehicles,
            actors_destroyed,
            duration: started.elapsed(),
        })
    }

    async fn execute(
        backend: &B,
        traffic_manager: &T,
        agent: A,
        sink: Arc<dyn FrameSink>,
        config: &SessionConfig,
        clock: &mut SimulationClock<B, T>,
        registry: &mut ActorRegistry,
    ) -> Result<(u64, u64, usize, bool)> {
        clock.enter_sync_mode(config.fixed_step_seconds).await?;
        backend.set_weather(config.weather).await?;

        let mut pool = SpawnPointPool::shuffled(backend.spawn_points().await?);

        let traffic = TrafficPopulation::new(backend.clone(), traffic_manager.clone());
        let vehicles = traffic
            .spawn_background_vehicles(config.background_vehicles, &mut pool, registry)
            .await?;
        traffic
            .apply_global_speed_difference(config.global_speed_difference_pct)
            .await?;
        for vehicle in &vehicles {
            traffic.apply_behavior(*vehicle, &config.profile).await?;
        }

        let mut ego = EgoController::new(
            backend.clone(),
            agent,
            SensorBridge::new(SENSOR_QUEUE_CAPACITY),
            sink,
            config.frame_timeout,
        );
        ego.run(clock, registry, &mut pool).await?;

        let arrived = ego.state() == EgoState::Arrived;
        Ok((ego.ticks(), ego.frames_consumed(), vehicles.len(), arrived))
    }
}
