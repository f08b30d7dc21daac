//! # Orchestrator
//!
//! The run core: actor lifecycle, tick/sensor synchronization, traffic
//! behavior, and unconditional teardown around one simulated drive.
//!
//! One logical control thread owns the clock and the driving loop; the only
//! other concurrent actor is the backend's sensor callback thread, bridged
//! into the loop through a bounded queue.

mod bridge;
mod ego;
mod error;
mod registry;
mod session;
mod sink;
mod spawn_points;
mod teardown;
mod traffic;

pub use bridge::SensorBridge;
pub use ego::{choose_destination, EgoController, EgoState};
pub use error::{Result, RunError};
pub use registry::ActorRegistry;
pub use session::{RunReport, RunSession, SessionConfig};
pub use sink::DirectorySink;
pub use spawn_points::SpawnPointPool;
pub use teardown::TeardownManager;
pub use traffic::TrafficPopulation;
