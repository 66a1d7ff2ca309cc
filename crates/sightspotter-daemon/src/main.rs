//! Sightspotter - Main entry point
//!
//! Host shell that replays a sensor scenario through the sight session and
//! prints where each nearby sight was anchored.

mod config;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use sightspotter_core::{AnchorRecord, CameraPose, MemoryArSession};
use sightspotter_geosearch::{FileProvider, GeosearchClient, PlacemarkProvider};
use sightspotter_session::{HostEvent, SessionEvent, SightSession};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::scenario::{Scenario, ScenarioSensors};

#[derive(Parser, Debug)]
#[command(name = "sightspotter")]
#[command(about = "Place nearby sights as AR anchors from a sensor scenario")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sightspotter.toml")]
    config: PathBuf,

    /// Path to the sensor scenario file
    #[arg(short, long, default_value = "scenario.toml")]
    scenario: PathBuf,

    /// Use a saved geosearch JSON response instead of the network
    #[arg(short, long)]
    response: Option<PathBuf>,

    /// Print anchors as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write a default configuration file and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Sightspotter v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let config = config::load_config(&args.config)?;
    let scenario = Scenario::load(&args.scenario)?;

    info!(
        fixes = scenario.fixes.len(),
        headings = scenario.heading_samples.len(),
        camera = scenario.camera.is_some(),
        "Scenario loaded"
    );

    let records = match &args.response {
        Some(path) => run(Arc::new(FileProvider::new(path)), &config, &scenario).await?,
        None => {
            let client = GeosearchClient::new(config.geosearch.clone())
                .context("Failed to create geosearch client")?;
            run(Arc::new(client), &config, &scenario).await?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_records(&records);
    }

    Ok(())
}

/// Replay the scenario through a session and collect the placed anchors
async fn run<P: PlacemarkProvider>(
    provider: Arc<P>,
    config: &Config,
    scenario: &Scenario,
) -> Result<Vec<AnchorRecord>> {
    let (tx, rx) = mpsc::channel(config.session.channel_capacity.max(1));
    let sensors = ScenarioSensors::new(tx.clone(), scenario);
    let ar = MemoryArSession::new(scenario.camera.map(CameraPose::from));

    let session = SightSession::new(provider, sensors, ar, &config.session);
    let mut events = session.subscribe();
    let directory = session.directory();
    let handle = tokio::spawn(session.run(rx));

    tx.send(HostEvent::AuthorizationChanged(scenario.authorization))
        .await
        .context("Session stopped unexpectedly")?;

    if !scenario.authorization.is_authorized() {
        warn!("Scenario does not grant location access, nothing to place");
    } else if scenario.fixes.is_empty() {
        warn!("Scenario has no location fixes, nothing to place");
    } else {
        let timeout = Duration::from_secs(config.daemon.placement_timeout_secs);
        match tokio::time::timeout(timeout, wait_for_cycle_end(&mut events)).await {
            Ok(Some(event)) => info!(event = ?event, "Placement cycle finished"),
            Ok(None) => warn!("Session closed before the cycle finished"),
            Err(_) => warn!(
                timeout_secs = config.daemon.placement_timeout_secs,
                "Timed out waiting for placement"
            ),
        }
    }

    let records = directory.records().await;

    tx.send(HostEvent::Shutdown)
        .await
        .context("Session stopped unexpectedly")?;
    handle.await.context("Session task failed")?;

    Ok(records)
}

/// Wait for the event that ends a placement cycle
async fn wait_for_cycle_end(
    events: &mut broadcast::Receiver<SessionEvent>,
) -> Option<SessionEvent> {
    loop {
        match events.recv().await {
            Ok(event) => match event {
                SessionEvent::FetchFailed { .. }
                | SessionEvent::PlacementCompleted { .. }
                | SessionEvent::PlacementAborted { .. } => return Some(event),
                other => info!(event = ?other, "Session progress"),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "Missed session events");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

fn print_records(records: &[AnchorRecord]) {
    println!("Placed {} anchors:", records.len());
    for record in records {
        let position = record.transform.w_axis;
        println!("  - {} ({})", record.title, record.id);
        println!(
            "    Bearing: {:.1}°  Distance: {:.0} m",
            record.bearing, record.distance_m
        );
        println!(
            "    Position: ({:.3}, {:.3}, {:.3})",
            position.x, position.y, position.z
        );
        if let Some(description) = &record.description {
            println!("    {}", description);
        }
    }
}
