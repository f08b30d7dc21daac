//! # carla-pilot CLI
//!
//! Entry point for one orchestrated drive:
//! - logging initialization
//! - session wiring and lifecycle
//! - run summary reporting

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::Layer;

use cli::Cli;
use orchestrator::{DirectorySink, RunReport, RunSession, SessionConfig};
use sim_client::{MockAgent, MockBackend, MockTrafficManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "carla-pilot starting");

    let backend = MockBackend::new();
    let traffic_manager = MockTrafficManager::new(cli.tm_port);
    let agent = MockAgent::new(cli.agent.into(), cli.route_length);
    let sink = Arc::new(
        DirectorySink::new(&cli.output)
            .with_context(|| format!("failed to create output directory {:?}", cli.output))?,
    );

    let config = SessionConfig {
        host: cli.host.clone(),
        port: cli.port,
        connect_timeout: Duration::from_secs(cli.timeout),
        background_vehicles: cli.vehicles,
        frame_timeout: Duration::from_secs(cli.frame_timeout),
        ..Default::default()
    };

    let session = RunSession::new(backend, traffic_manager, agent, sink, config);
    match session.run().await {
        Ok(report) => {
            let summary = RunSummary::from(&report);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "run failed");
            Err(e.into())
        }
    }
}

/// Machine-readable outcome of a completed run
#[derive(Debug, Serialize)]
struct RunSummary {
    arrived: bool,
    ticks: u64,
    frames_consumed: u64,
    background_vehicles: usize,
    actors_destroyed: usize,
    duration_secs: f64,
}

impl From<&RunReport> for RunSummary {
    fn from(report: &RunReport) -> Self {
        Self {
            arrived: report.arrived,
            ticks: report.ticks,
            frames_consumed: report.frames_consumed,
            background_vehicles: report.background_vehicles,
            actors_destroyed: report.actors_destroyed,
            duration_secs: report.duration.as_secs_f64(),
        }
    }
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else {
        let default_level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let fmt_layer = match cli.log_format {
        cli::LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        cli::LogFormat::Pretty => fmt::layer().pretty().boxed(),
        cli::LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}
