//! Actor handles and spatial types.
//!
//! Opaque handles to simulated entities plus the transforms they live at.

use serde::{Deserialize, Serialize};

/// Backend actor handle type
pub type ActorId = u32;

/// Actor type tag
///
/// Determines teardown ordering: sensors are destroyed before the vehicles
/// they are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Vehicle,
    Sensor,
    Spectator,
}

/// 3D transform: position + rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position (x, y, z) in meters
    pub location: Location,

    /// Rotation (pitch, yaw, roll) in degrees
    pub rotation: Rotation,
}

impl Transform {
    /// Transform at a location with zero rotation
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            location: Location { x, y, z },
            rotation: Rotation::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// One control command for a vehicle
///
/// Produced by the navigation agent, applied verbatim to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    /// Throttle in [0, 1]
    pub throttle: f64,

    /// Steering in [-1, 1]
    pub steer: f64,

    /// Brake in [0, 1]
    pub brake: f64,
}

/// Backend world settings relevant to stepping
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Whether the backend waits for an explicit tick per step
    pub synchronous_mode: bool,

    /// Fixed step length in seconds; None = variable step
    pub fixed_delta_seconds: Option<f64>,
}

/// World weather parameters
///
/// Only the knobs the run actually sets; angles in degrees, the rest in
/// percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherParams {
    pub cloudiness: f64,
    pub precipitation: f64,
    pub sun_altitude_angle: f64,
    pub fog_density: f64,
}

impl Default for WeatherParams {
    /// Lightly clouded, dry, high sun
    fn default() -> Self {
        Self {
            cloudiness: 10.0,
            precipitation: 0.0,
            sun_altitude_angle: 70.0,
            fog_density: 0.0,
        }
    }
}

/// Vehicle blueprint descriptor
///
/// A template for spawnable vehicles; `wheels` is used to filter the
/// background-traffic candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleBlueprint {
    /// Blueprint name, e.g. "vehicle.tesla.model3"
    pub id: String,

    /// Number of wheels
    pub wheels: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_roundtrips_through_json() {
        let transform = Transform::at(1.0, -2.5, 0.3);
        let json = serde_json::to_string(&transform).unwrap();
        let back: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, transform);
    }

    #[test]
    fn locations_compare_exactly() {
        let a = Location {
            x: 10.0,
            y: 5.0,
            z: 0.0,
        };
        let b = a;
        assert_eq!(a, b);
        assert_ne!(
            a,
            Location {
                x: 10.1,
                ..a
            }
        );
    }
}
