//! Mock simulation backend
//!
//! Mock implementation for unit tests and server-less runs, with injectable
//! failure scenarios. Sensor callbacks fire off the caller's thread like the
//! real backend's, but through one long-lived delivery worker so frames
//! always arrive in tick order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    ActorId, FrameCallback, Location, Result, SensorFrame, SensorSource, SimError, Transform,
    VehicleBlueprint, VehicleControl, WeatherParams, WorldSettings,
};
use tracing::instrument;

use crate::client::{SimulationBackend, TrafficManager};

/// Mock backend configuration
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// 1-based spawn attempt indices that should fail
    pub fail_spawns_at: Vec<u32>,
    /// Actor ids whose destroy should fail
    pub fail_destroy: Vec<ActorId>,
    /// tick() fails once the frame counter would reach this value
    pub fail_tick_at: Option<u64>,
    /// Override the spawn point list
    pub spawn_points: Option<Vec<Transform>>,
}

struct MockActor {
    blueprint: String,
    transform: Transform,
    attached_to: Option<ActorId>,
}

struct Listener {
    name: String,
    callback: FrameCallback,
}

type DeliveryBatch = (u64, Vec<(String, FrameCallback)>);

struct MockState {
    connected: bool,
    settings: WorldSettings,
    weather: WeatherParams,
    next_actor_id: ActorId,
    spawn_attempts: u32,
    actors: HashMap<ActorId, MockActor>,
    destroy_calls: HashMap<ActorId, u32>,
    frame: u64,
    listeners: HashMap<ActorId, Listener>,
    autopilot: HashMap<ActorId, (bool, u16)>,
    spectator: Option<ActorId>,
    controls: Vec<(ActorId, VehicleControl)>,
}

impl MockState {
    fn new() -> Self {
        Self {
            connected: false,
            settings: WorldSettings::default(),
            weather: WeatherParams::default(),
            next_actor_id: 1000, // start above real-world ids for easy spotting
            spawn_attempts: 0,
            actors: HashMap::new(),
            destroy_calls: HashMap::new(),
            frame: 0,
            listeners: HashMap::new(),
            autopilot: HashMap::new(),
            spectator: None,
            controls: Vec::new(),
        }
    }
}

/// Mock simulation backend
///
/// Cloning shares the underlying world state, like handles to one server.
#[derive(Clone)]
pub struct MockBackend {
    config: MockConfig,
    state: Arc<Mutex<MockState>>,
    delivery_tx: mpsc::Sender<DeliveryBatch>,
}

impl MockBackend {
    /// Create a default mock backend
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a mock backend with failure injection
    pub fn with_config(config: MockConfig) -> Self {
        // One worker serializes all deliveries; it exits once every backend
        // handle is dropped.
        let (delivery_tx, delivery_rx) = mpsc::channel::<DeliveryBatch>();
        thread::spawn(move || {
            while let Ok((frame, fired)) = delivery_rx.recv() {
                for (name, callback) in fired {
                    callback(SensorFrame {
                        frame_id: frame,
                        sensor_name: name,
                        payload: Bytes::from_static(b"mock-frame-payload"),
                    });
                }
            }
        });
        Self {
            config,
            state: Arc::new(Mutex::new(MockState::new())),
            delivery_tx,
        }
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        self.state.lock().unwrap().actors.len()
    }

    /// How many times destroy was attempted for an actor
    pub fn destroy_calls(&self, actor_id: ActorId) -> u32 {
        self.state
            .lock()
            .unwrap()
            .destroy_calls
            .get(&actor_id)
            .copied()
            .unwrap_or(0)
    }

    /// Vehicles with autopilot currently enabled
    pub fn autopilot_enabled_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .autopilot
            .values()
            .filter(|(enabled, _)| *enabled)
            .count()
    }

    /// Spawn transforms of all live, non-attached vehicle actors
    pub fn vehicle_transforms(&self) -> Vec<Transform> {
        self.state
            .lock()
            .unwrap()
            .actors
            .values()
            .filter(|a| a.blueprint.starts_with("vehicle.") && a.attached_to.is_none())
            .map(|a| a.transform)
            .collect()
    }

    /// Destroy attempt counts for every actor ever targeted
    pub fn destroy_call_counts(&self) -> Vec<u32> {
        self.state
            .lock()
            .unwrap()
            .destroy_calls
            .values()
            .copied()
            .collect()
    }

    /// Current world settings as seen by the server
    pub fn current_settings(&self) -> WorldSettings {
        self.state.lock().unwrap().settings
    }

    /// Weather last applied to the world
    pub fn current_weather(&self) -> WeatherParams {
        self.state.lock().unwrap().weather
    }

    /// Control commands applied so far
    pub fn applied_control_count(&self) -> usize {
        self.state.lock().unwrap().controls.len()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.state.lock().unwrap().connected {
            Ok(())
        } else {
            Err(SimError::connection("not connected"))
        }
    }

    fn default_spawn_points() -> Vec<Transform> {
        // 6x5 grid, 10 m apart
        (0..30)
            .map(|i| Transform::at(f64::from(i % 6) * 10.0, f64::from(i / 6) * 10.0, 0.3))
            .collect()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBackend for MockBackend {
    #[instrument(name = "mock_connect", skip(self, _timeout), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, _timeout: Duration) -> Result<()> {
        let _ = (host, port);
        self.state.lock().unwrap().connected = true;
        Ok(())
    }

    async fn world_settings(&self) -> Result<WorldSettings> {
        self.ensure_connected()?;
        Ok(self.state.lock().unwrap().settings)
    }

    async fn apply_settings(&self, settings: WorldSettings) -> Result<()> {
        self.ensure_connected()?;
        self.state.lock().unwrap().settings = settings;
        Ok(())
    }

    async fn vehicle_blueprints(&self) -> Result<Vec<VehicleBlueprint>> {
        self.ensure_connected()?;
        Ok(vec![
            blueprint("vehicle.tesla.model3", 4),
            blueprint("vehicle.audi.tt", 4),
            blueprint("vehicle.mini.cooper", 4),
            blueprint("vehicle.nissan.patrol", 4),
            blueprint("vehicle.harley-davidson.low_rider", 2),
            blueprint("vehicle.kawasaki.ninja", 2),
        ])
    }

    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.ensure_connected()?;
        Ok(self
            .config
            .spawn_points
            .clone()
            .unwrap_or_else(Self::default_spawn_points))
    }

    #[instrument(
        name = "mock_spawn_actor",
        skip(self, transform),
        fields(blueprint = %blueprint, attached = attach_to.is_some())
    )]
    async fn spawn_actor(
        &self,
        blueprint: &str,
        transform: Transform,
        attach_to: Option<ActorId>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        let mut state = self.state.lock().unwrap();
        state.spawn_attempts += 1;

        if self.config.fail_spawns_at.contains(&state.spawn_attempts) {
            return Err(SimError::spawn(blueprint, "injected spawn failure"));
        }

        if let Some(parent) = attach_to {
            if !state.actors.contains_key(&parent) {
                return Err(SimError::spawn(blueprint, "parent actor not found"));
            }
        }

        let actor_id = state.next_actor_id;
        state.next_actor_id += 1;
        state.actors.insert(
            actor_id,
            MockActor {
                blueprint: blueprint.to_string(),
                transform,
                attached_to: attach_to,
            },
        );
        Ok(actor_id)
    }

    #[instrument(name = "mock_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        *state.destroy_calls.entry(actor_id).or_insert(0) += 1;

        if self.config.fail_destroy.contains(&actor_id) {
            return Err(SimError::destroy(actor_id, "injected destroy failure"));
        }

        // idempotent: Ok even when already gone
        state.actors.remove(&actor_id);
        state.listeners.remove(&actor_id);
        state.autopilot.remove(&actor_id);
        Ok(())
    }

    async fn tick(&self) -> Result<u64> {
        self.ensure_connected()?;

        let (frame, fired) = {
            let mut state = self.state.lock().unwrap();
            if let Some(limit) = self.config.fail_tick_at {
                if state.frame + 1 >= limit {
                    return Err(SimError::command("tick", "injected tick failure"));
                }
            }
            state.frame += 1;
            let frame = state.frame;
            let fired: Vec<(String, FrameCallback)> = state
                .listeners
                .values()
                .map(|l| (l.name.clone(), l.callback.clone()))
                .collect();
            (frame, fired)
        };

        // Delivered off the caller's thread like the real backend, but
        // through the single worker so frames from adjacent ticks cannot
        // reorder.
        if !fired.is_empty() {
            let _ = self.delivery_tx.send((frame, fired));
        }

        Ok(frame)
    }

    async fn actor_location(&self, actor_id: ActorId) -> Result<Location> {
        let state = self.state.lock().unwrap();
        state
            .actors
            .get(&actor_id)
            .map(|a| a.transform.location)
            .ok_or(SimError::ActorNotFound { actor_id })
    }

    async fn spectator(&self) -> Result<ActorId> {
        self.ensure_connected()?;
        let mut state = self.state.lock().unwrap();
        if let Some(id) = state.spectator {
            return Ok(id);
        }
        let actor_id = state.next_actor_id;
        state.next_actor_id += 1;
        state.actors.insert(
            actor_id,
            MockActor {
                blueprint: "spectator".to_string(),
                transform: Transform::at(0.0, 0.0, 50.0),
                attached_to: None,
            },
        );
        state.spectator = Some(actor_id);
        Ok(actor_id)
    }

    async fn set_actor_transform(&self, actor_id: ActorId, transform: Transform) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.actors.get_mut(&actor_id) {
            Some(actor) => {
                actor.transform = transform;
                Ok(())
            }
            None => Err(SimError::ActorNotFound { actor_id }),
        }
    }

    async fn speed_limit(&self, actor_id: ActorId) -> Result<f64> {
        let state = self.state.lock().unwrap();
        if state.actors.contains_key(&actor_id) {
            Ok(30.0)
        } else {
            Err(SimError::ActorNotFound { actor_id })
        }
    }

    async fn apply_control(&self, actor_id: ActorId, control: &VehicleControl) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.actors.contains_key(&actor_id) {
            return Err(SimError::ActorNotFound { actor_id });
        }
        state.controls.push((actor_id, *control));
        Ok(())
    }

    async fn set_weather(&self, weather: WeatherParams) -> Result<()> {
        self.ensure_connected()?;
        self.state.lock().unwrap().weather = weather;
        Ok(())
    }

    async fn set_autopilot(&self, actor_id: ActorId, enabled: bool, tm_port: u16) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.actors.contains_key(&actor_id) {
            return Err(SimError::ActorNotFound { actor_id });
        }
        state.autopilot.insert(actor_id, (enabled, tm_port));
        Ok(())
    }

    fn sensor_source(&self, actor_id: ActorId, name: String) -> Option<Box<dyn SensorSource>> {
        let state = self.state.lock().unwrap();
        if !state.actors.contains_key(&actor_id) {
            return None;
        }
        Some(Box::new(MockSensorSource {
            state: self.state.clone(),
            actor_id,
            name,
            listening: Arc::new(AtomicBool::new(false)),
        }))
    }
}

fn blueprint(id: &str, wheels: u32) -> VehicleBlueprint {
    VehicleBlueprint {
        id: id.to_string(),
        wheels,
    }
}

/// Mock sensor source
///
/// Registers its callback in the shared backend state; `tick()` drives the
/// actual delivery.
struct MockSensorSource {
    state: Arc<Mutex<MockState>>,
    actor_id: ActorId,
    name: String,
    listening: Arc<AtomicBool>,
}

impl SensorSource for MockSensorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn listen(&self, callback: FrameCallback) {
        // idempotent: second listen is ignored
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state.lock().unwrap().listeners.insert(
            self.actor_id,
            Listener {
                name: self.name.clone(),
                callback,
            },
        );
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            self.state.lock().unwrap().listeners.remove(&self.actor_id);
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct TmState {
    sync_mode: bool,
    global_speed_diff: Option<f64>,
    ignore_lights: HashMap<ActorId, f64>,
    follow_distance: HashMap<ActorId, f64>,
    speed_diff: HashMap<ActorId, f64>,
}

/// Mock traffic manager
///
/// Records every knob it is handed, for assertions.
#[derive(Clone)]
pub struct MockTrafficManager {
    port: u16,
    state: Arc<Mutex<TmState>>,
}

impl MockTrafficManager {
    /// Create a mock traffic manager bound to a port
    pub fn new(port: u16) -> Self {
        Self {
            port,
            state: Arc::new(Mutex::new(TmState::default())),
        }
    }

    /// Whether synchronous mode is currently enabled
    pub fn is_sync_mode(&self) -> bool {
        self.state.lock().unwrap().sync_mode
    }

    /// The one-shot global speed difference, if set
    pub fn global_speed_difference(&self) -> Option<f64> {
        self.state.lock().unwrap().global_speed_diff
    }

    /// Vehicles that received a full behavior profile
    pub fn configured_vehicle_count(&self) -> usize {
        self.state.lock().unwrap().speed_diff.len()
    }

    /// The recorded (lights, distance, speed) knobs for a vehicle
    pub fn profile_of(&self, vehicle: ActorId) -> Option<(f64, f64, f64)> {
        let state = self.state.lock().unwrap();
        Some((
            *state.ignore_lights.get(&vehicle)?,
            *state.follow_distance.get(&vehicle)?,
            *state.speed_diff.get(&vehicle)?,
        ))
    }
}

impl TrafficManager for MockTrafficManager {
    async fn set_sync_mode(&self, enabled: bool) -> Result<()> {
        self.state.lock().unwrap().sync_mode = enabled;
        Ok(())
    }

    async fn set_global_speed_difference(&self, pct: f64) -> Result<()> {
        self.state.lock().unwrap().global_speed_diff = Some(pct);
        Ok(())
    }

    async fn ignore_lights_percentage(&self, vehicle: ActorId, pct: f64) -> Result<()> {
        self.state.lock().unwrap().ignore_lights.insert(vehicle, pct);
        Ok(())
    }

    async fn distance_to_leading_vehicle(&self, vehicle: ActorId, meters: f64) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .follow_distance
            .insert(vehicle, meters);
        Ok(())
    }

    async fn vehicle_speed_difference(&self, vehicle: ActorId, pct: f64) -> Result<()> {
        self.state.lock().unwrap().speed_diff.insert(vehicle, pct);
        Ok(())
    }

    fn port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected() -> MockBackend {
        let mut backend = MockBackend::new();
        backend
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn spawn_allocates_ids_above_1000() {
        let backend = connected().await;
        let id = backend
            .spawn_actor("vehicle.tesla.model3", Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();
        assert!(id >= 1000);
        assert_eq!(backend.actor_count(), 1);
    }

    #[tokio::test]
    async fn spawn_requires_connection() {
        let backend = MockBackend::new();
        let err = backend
            .spawn_actor("vehicle.tesla.model3", Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SimError::Connection { .. }));
    }

    #[tokio::test]
    async fn attach_requires_live_parent() {
        let backend = connected().await;
        let err = backend
            .spawn_actor("sensor.camera.rgb", Transform::at(-5.0, 0.0, 2.0), Some(42))
            .await
            .unwrap_err();
        assert!(matches!(err, SimError::Spawn { .. }));
    }

    #[tokio::test]
    async fn destroy_is_idempotent_and_counted() {
        let backend = connected().await;
        let id = backend
            .spawn_actor("vehicle.audi.tt", Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();

        backend.destroy_actor(id).await.unwrap();
        backend.destroy_actor(id).await.unwrap();

        assert_eq!(backend.actor_count(), 0);
        assert_eq!(backend.destroy_calls(id), 2);
    }

    #[tokio::test]
    async fn injected_spawn_failures_hit_the_right_attempt() {
        let mut backend = MockBackend::with_config(MockConfig {
            fail_spawns_at: vec![2],
            ..Default::default()
        });
        backend
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();

        backend
            .spawn_actor("vehicle.audi.tt", Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();
        let err = backend
            .spawn_actor("vehicle.audi.tt", Transform::at(10.0, 0.0, 0.3), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SimError::Spawn { .. }));
    }

    #[tokio::test]
    async fn tick_delivers_frames_to_listeners() {
        let backend = connected().await;
        let vehicle = backend
            .spawn_actor("vehicle.tesla.model3", Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();
        let camera = backend
            .spawn_actor(
                "sensor.camera.rgb",
                Transform::at(-5.0, 0.0, 2.0),
                Some(vehicle),
            )
            .await
            .unwrap();

        let source = backend.sensor_source(camera, "camera".to_string()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        source.listen(Arc::new(move |frame| {
            tx.send(frame).unwrap();
        }));

        let frame_no = backend.tick().await.unwrap();
        let frame = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(frame.frame_id, frame_no);
        assert_eq!(frame.sensor_name, "camera");
    }

    #[tokio::test]
    async fn frames_deliver_in_tick_order() {
        let backend = connected().await;
        let vehicle = backend
            .spawn_actor("vehicle.tesla.model3", Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();
        let camera = backend
            .spawn_actor(
                "sensor.camera.rgb",
                Transform::at(-5.0, 0.0, 2.0),
                Some(vehicle),
            )
            .await
            .unwrap();

        let source = backend.sensor_source(camera, "camera".to_string()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        source.listen(Arc::new(move |frame| {
            tx.send(frame).unwrap();
        }));

        // back-to-back ticks must never reorder deliveries
        for _ in 0..20 {
            backend.tick().await.unwrap();
        }
        let frame_ids: Vec<u64> = (0..20)
            .map(|_| rx.recv_timeout(Duration::from_secs(1)).unwrap().frame_id)
            .collect();
        assert_eq!(frame_ids, (1..=20).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn weather_is_recorded() {
        let backend = connected().await;
        let weather = WeatherParams {
            cloudiness: 80.0,
            ..Default::default()
        };
        backend.set_weather(weather).await.unwrap();
        assert_eq!(backend.current_weather(), weather);
    }

    #[tokio::test]
    async fn batch_destroy_reports_per_actor_results() {
        let mut backend = MockBackend::with_config(MockConfig {
            fail_destroy: vec![1001],
            ..Default::default()
        });
        backend
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        let a = backend
            .spawn_actor("vehicle.audi.tt", Transform::at(0.0, 0.0, 0.3), None)
            .await
            .unwrap();
        let b = backend
            .spawn_actor("vehicle.mini.cooper", Transform::at(10.0, 0.0, 0.3), None)
            .await
            .unwrap();

        let results = backend.destroy_actors(&[a, b]).await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        // the failure does not stop the batch; only the failed actor remains
        assert_eq!(backend.actor_count(), 1);
    }

    #[tokio::test]
    async fn tick_failure_injection() {
        let mut backend = MockBackend::with_config(MockConfig {
            fail_tick_at: Some(3),
            ..Default::default()
        });
        backend
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(backend.tick().await.unwrap(), 1);
        assert_eq!(backend.tick().await.unwrap(), 2);
        assert!(matches!(
            backend.tick().await.unwrap_err(),
            SimError::Command { .. }
        ));
    }

    #[tokio::test]
    async fn traffic_manager_records_knobs() {
        let tm = MockTrafficManager::new(8000);
        tm.set_sync_mode(true).await.unwrap();
        tm.set_global_speed_difference(30.0).await.unwrap();
        tm.ignore_lights_percentage(7, 5.0).await.unwrap();
        tm.distance_to_leading_vehicle(7, 2.0).await.unwrap();
        tm.vehicle_speed_difference(7, -20.0).await.unwrap();

        assert!(tm.is_sync_mode());
        assert_eq!(tm.global_speed_difference(), Some(30.0));
        assert_eq!(tm.profile_of(7), Some((5.0, 2.0, -20.0)));
        assert_eq!(tm.port(), 8000);
    }
}
