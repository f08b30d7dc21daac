//! SensorSource trait - sensor data source abstraction
//!
//! Unified interface over real backend sensors and mock sensors, so the
//! bridge never depends on a concrete sensor implementation.

use std::sync::Arc;

use crate::SensorFrame;

/// Sensor data callback type
///
/// Invoked on the sensor's own delivery thread each time a frame arrives.
/// `Arc` so the callback can be shared across contexts.
pub type FrameCallback = Arc<dyn Fn(SensorFrame) + Send + Sync>;

/// Sensor data source trait
///
/// Callbacks rather than channels, consistent with the backend's native
/// listen pattern; the bridge converts the callback into a bounded queue.
pub trait SensorSource: Send + Sync {
    /// Subscription name for this sensor
    fn name(&self) -> &str;

    /// Register the data callback
    ///
    /// Idempotent: a second call while already listening is ignored.
    fn listen(&self, callback: FrameCallback);

    /// Stop delivering frames
    fn stop(&self);

    /// Whether a callback is currently registered
    fn is_listening(&self) -> bool;
}
