//! Layered error definitions
//!
//! Categorized by source: connection / spawn / command / destroy / io

use thiserror::Error;

use crate::ActorId;

/// Unified backend-facing error type
#[derive(Debug, Error)]
pub enum SimError {
    /// Backend unreachable; fatal, never retried
    #[error("backend connection error: {message}")]
    Connection { message: String },

    /// Actor spawn rejected
    ///
    /// Fatal for the ego vehicle and its sensor; tolerated and skipped only
    /// during bulk background-vehicle population.
    #[error("spawn error for blueprint '{blueprint}': {message}")]
    Spawn { blueprint: String, message: String },

    /// Any other rejected backend call; fatal
    #[error("backend command '{op}' failed: {message}")]
    Command { op: String, message: String },

    /// Actor destroy rejected; logged during teardown, never raised
    #[error("failed to destroy actor {actor_id}: {message}")]
    Destroy { actor_id: ActorId, message: String },

    /// Actor handle no longer valid
    #[error("actor not found: {actor_id}")]
    ActorNotFound { actor_id: ActorId },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }

    /// Create a command error
    pub fn command(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            op: op.into(),
            message: message.into(),
        }
    }

    /// Create a destroy error
    pub fn destroy(actor_id: ActorId, message: impl Into<String>) -> Self {
        Self::Destroy {
            actor_id,
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SimError>;
