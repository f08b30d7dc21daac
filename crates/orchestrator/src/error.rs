//! Run-level error types

use contracts::SimError;
use thiserror::Error;

/// Orchestration error
///
/// Only per-vehicle spawn failures during bulk population are swallowed (and
/// logged) upstream of this type; everything here terminates the run and
/// proceeds to teardown.
#[derive(Debug, Error)]
pub enum RunError {
    /// Rejected or failed backend call
    #[error(transparent)]
    Backend(#[from] SimError),

    /// No sensor frame arrived within the bound
    #[error("no sensor frame within {waited_ms}ms")]
    FrameTimeout { waited_ms: u64 },

    /// The sensor callback side of the bridge is gone
    #[error("sensor channel closed")]
    SensorClosed,

    /// The ego state machine was driven past a terminal state
    #[error("ego controller already reached a terminal state")]
    AlreadyTerminated,
}

/// Result alias
pub type Result<T> = std::result::Result<T, RunError>;
