//! # Contracts
//!
//! Shared interface contracts: inter-crate data structures and traits.
//! All business crates depend on this crate only; reverse dependencies are
//! prohibited.
//!
//! ## Time Model
//! - The simulation advances in fixed steps (ticks) issued by the client
//! - `frame_id` is the backend frame counter, monotonically increasing

mod actor;
mod agent;
mod behavior;
mod error;
mod frame;
mod source;

pub use actor::*;
pub use agent::{AgentKind, NavigationAgent};
pub use behavior::*;
pub use error::*;
pub use frame::*;
pub use source::{FrameCallback, SensorSource};
