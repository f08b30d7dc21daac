//! Background-traffic behavior profile and fixed run constants.

use serde::{Deserialize, Serialize};

/// Per-vehicle autonomous driving profile
///
/// Applied through the traffic manager to each background vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleBehaviorProfile {
    /// Probability (percent) of ignoring a traffic light
    pub ignore_lights_pct: f64,

    /// Minimum distance to the leading vehicle, meters
    pub min_follow_distance_m: f64,

    /// Target speed delta vs. the speed limit, percent (negative = overspeed)
    pub speed_delta_pct: f64,
}

impl Default for VehicleBehaviorProfile {
    fn default() -> Self {
        Self {
            ignore_lights_pct: 5.0,
            min_follow_distance_m: 2.0,
            speed_delta_pct: -20.0,
        }
    }
}

/// Background vehicles attempted per run
pub const BACKGROUND_VEHICLE_COUNT: usize = 10;

/// Sensor queue capacity; the producer blocks when full
pub const SENSOR_QUEUE_CAPACITY: usize = 10;

/// Fixed step length, seconds (20 Hz)
pub const FIXED_STEP_SECONDS: f64 = 0.05;

/// Population-wide speed difference, percent
pub const GLOBAL_SPEED_DIFFERENCE_PCT: f64 = 30.0;

/// Traffic manager port
pub const TRAFFIC_MANAGER_PORT: u16 = 8000;

/// Background candidates are filtered to this wheel count
pub const REQUIRED_WHEEL_COUNT: u32 = 4;
