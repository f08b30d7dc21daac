//! SensorFrame - sensor callback output
//!
//! One delivered sensor measurement, plus the sink seam that persists it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One sensor measurement delivered by the backend
///
/// Produced once per tick per subscribed sensor; consumed exactly once by the
/// control loop. Frame ids are non-decreasing per sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Backend frame counter, monotonically increasing
    pub frame_id: u64,

    /// Subscription name, e.g. "camera"
    pub sensor_name: String,

    /// Opaque payload (zero-copy); the core never interprets it
    pub payload: Bytes,
}

/// Persistence collaborator for delivered frames
///
/// Invoked from the sensor callback thread, before the frame is handed to the
/// control loop. Implementations must be cheap enough not to stall the
/// producer indefinitely.
pub trait FrameSink: Send + Sync {
    /// Persist one frame's payload
    fn persist(&self, frame: &SensorFrame) -> std::io::Result<()>;
}
