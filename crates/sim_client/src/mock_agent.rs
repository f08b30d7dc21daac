//! Scripted navigation agent
//!
//! Deterministic `NavigationAgent` for tests and server-less runs: every
//! destination yields a fixed-length route that shrinks by one waypoint per
//! control step.

use contracts::{AgentKind, Location, NavigationAgent, VehicleControl};
use tracing::debug;

/// Scripted agent with a countdown route
pub struct MockAgent {
    kind: AgentKind,
    route_len: usize,
    remaining: usize,
    destination: Option<Location>,
    target_speed: f64,
}

impl MockAgent {
    /// Create an agent whose routes are `route_len` waypoints long
    pub fn new(kind: AgentKind, route_len: usize) -> Self {
        Self {
            kind,
            route_len,
            remaining: 0,
            destination: None,
            target_speed: 0.0,
        }
    }

    /// The destination last routed to
    pub fn destination(&self) -> Option<Location> {
        self.destination
    }

    /// The target speed last pushed
    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }
}

impl NavigationAgent for MockAgent {
    fn set_destination(&mut self, destination: Location) {
        debug!(kind = ?self.kind, ?destination, "routing to destination");
        self.destination = Some(destination);
        self.remaining = self.route_len;
    }

    fn update_information(&mut self) {}

    fn run_step(&mut self) -> VehicleControl {
        self.remaining = self.remaining.saturating_sub(1);
        VehicleControl {
            throttle: 0.5,
            steer: 0.0,
            brake: 0.0,
        }
    }

    fn set_target_speed(&mut self, limit: f64) {
        self.target_speed = limit;
    }

    fn remaining_waypoints(&self) -> usize {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_shrinks_one_waypoint_per_step() {
        let mut agent = MockAgent::new(AgentKind::Behavior, 3);
        agent.set_destination(Location {
            x: 10.0,
            y: 0.0,
            z: 0.0,
        });
        assert_eq!(agent.remaining_waypoints(), 3);

        agent.run_step();
        agent.run_step();
        assert_eq!(agent.remaining_waypoints(), 1);

        agent.run_step();
        agent.run_step(); // never goes negative
        assert_eq!(agent.remaining_waypoints(), 0);
    }

    #[test]
    fn new_destination_regrows_the_route() {
        let mut agent = MockAgent::new(AgentKind::Basic, 2);
        agent.set_destination(Location::default());
        agent.run_step();
        agent.run_step();
        assert_eq!(agent.remaining_waypoints(), 0);

        agent.set_destination(Location {
            x: 5.0,
            y: 5.0,
            z: 0.0,
        });
        assert_eq!(agent.remaining_waypoints(), 2);
    }
}
