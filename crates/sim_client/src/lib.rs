//! # Sim Client
//!
//! Simulation backend abstraction: the `SimulationBackend` and
//! `TrafficManager` traits, a mock implementation with failure injection,
//! the scripted mock navigation agent, and the sync-mode clock guard.

mod client;
mod clock;
mod mock_agent;
mod mock_client;

pub use client::{SimulationBackend, TrafficManager};
pub use clock::SimulationClock;
pub use mock_agent::MockAgent;
pub use mock_client::{MockBackend, MockConfig, MockTrafficManager};
