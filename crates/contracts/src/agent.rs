//! NavigationAgent trait - route planning abstraction
//!
//! The control loop depends only on this capability interface, never on a
//! specific agent variant.

use crate::{Location, VehicleControl};

/// Agent variant selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentKind {
    /// Shortest-path routing, no behavior model
    Basic,
    /// Routing with a driving-behavior model
    #[default]
    Behavior,
}

/// Navigation agent capability interface
///
/// The agent owns the route; its waypoint count strictly shrinks as the
/// vehicle progresses and never regrows without a new destination.
pub trait NavigationAgent: Send {
    /// Plan a route from the vehicle's current location to `destination`
    fn set_destination(&mut self, destination: Location);

    /// Refresh the agent's view of the current vehicle state
    ///
    /// Called once per driving iteration, before the tick.
    fn update_information(&mut self);

    /// Compute one control command for the current step
    fn run_step(&mut self) -> VehicleControl;

    /// Push the current speed limit as the agent's target speed
    fn set_target_speed(&mut self, limit: f64);

    /// Waypoints left on the planned route
    fn remaining_waypoints(&self) -> usize;
}
