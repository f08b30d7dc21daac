//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use contracts::AgentKind;
use std::path::PathBuf;

/// carla-pilot - drive one ego vehicle through a populated simulation
#[derive(Parser, Debug)]
#[command(
    name = "carla-pilot",
    author,
    version,
    about = "Single-run ego drive with synchronized sensor capture",
    long_about = "Populates the simulation with background traffic, spawns one \n\
                  ego vehicle with an attached camera, drives it to a planned \n\
                  destination with tick/sensor synchronization, and tears every \n\
                  created actor down at the end."
)]
pub struct Cli {
    /// Simulation server host
    #[arg(long, default_value = "localhost", env = "CARLA_HOST")]
    pub host: String,

    /// Simulation server port
    #[arg(long, default_value = "2000", env = "CARLA_PORT")]
    pub port: u16,

    /// Connection timeout in seconds
    #[arg(long, default_value = "10", env = "CARLA_PILOT_TIMEOUT")]
    pub timeout: u64,

    /// Background vehicles to spawn
    #[arg(long, default_value = "10", env = "CARLA_PILOT_VEHICLES")]
    pub vehicles: usize,

    /// Directory for captured sensor frames
    #[arg(long, default_value = "_out", env = "CARLA_PILOT_OUTPUT")]
    pub output: PathBuf,

    /// Seconds to wait for a sensor frame before failing the run
    #[arg(long, default_value = "10", env = "CARLA_PILOT_FRAME_TIMEOUT")]
    pub frame_timeout: u64,

    /// Navigation agent variant
    #[arg(long, value_enum, default_value = "behavior")]
    pub agent: AgentChoice,

    /// Waypoints per planned route (scripted agent)
    #[arg(long, default_value = "120", env = "CARLA_PILOT_ROUTE_LENGTH")]
    pub route_length: usize,

    /// Traffic manager port
    #[arg(long, default_value = "8000", env = "CARLA_TM_PORT")]
    pub tm_port: u16,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "CARLA_PILOT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        env = "CARLA_PILOT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

/// Navigation agent variant flag
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum AgentChoice {
    /// Shortest-path routing, no behavior model
    Basic,
    /// Routing with a driving-behavior model
    #[default]
    Behavior,
}

impl From<AgentChoice> for AgentKind {
    fn from(choice: AgentChoice) -> Self {
        match choice {
            AgentChoice::Basic => AgentKind::Basic,
            AgentChoice::Behavior => AgentKind::Behavior,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
