//! Scripted sensor scenario
//!
//! Stands in for the device's location, heading and camera sources. A
//! scenario file looks like:
//!
//! ```toml
//! authorization = "authorized_when_in_use"
//! heading_samples = [{ degrees = 80.0 }, { degrees = 92.5 }, { degrees = 95.0 }]
//!
//! [[fixes]]
//! latitude = 48.8566
//! longitude = 2.3522
//!
//! [camera]
//! yaw = 0.0
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sightspotter_core::{GeoPoint, HeadingSample, Pose};
use sightspotter_session::{AuthorizationStatus, HostEvent, SensorControl};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_authorization")]
    pub authorization: AuthorizationStatus,
    /// Error reported before any fix is delivered
    #[serde(default)]
    pub location_error: Option<String>,
    /// Fixes delivered together on the first location request, oldest first
    #[serde(default)]
    pub fixes: Vec<GeoPoint>,
    #[serde(default)]
    pub heading_samples: Vec<HeadingSample>,
    /// Camera pose of the live frame; absent means no frame is available
    #[serde(default)]
    pub camera: Option<Pose>,
}

fn default_authorization() -> AuthorizationStatus {
    AuthorizationStatus::AuthorizedWhenInUse
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        for fix in &scenario.fixes {
            fix.validate()?;
        }
        Ok(scenario)
    }
}

/// Sensor source that answers requests from the scenario by posting host
/// events back into the session's queue
pub struct ScenarioSensors {
    tx: mpsc::Sender<HostEvent>,
    location_error: Option<String>,
    fixes: Vec<GeoPoint>,
    heading_samples: Vec<HeadingSample>,
    heading_active: bool,
}

impl ScenarioSensors {
    pub fn new(tx: mpsc::Sender<HostEvent>, scenario: &Scenario) -> Self {
        Self {
            tx,
            location_error: scenario.location_error.clone(),
            fixes: scenario.fixes.clone(),
            heading_samples: scenario.heading_samples.clone(),
            heading_active: false,
        }
    }

    fn post(&self, event: HostEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "Dropping scenario event");
        }
    }
}

impl SensorControl for ScenarioSensors {
    fn request_location(&mut self) {
        if let Some(message) = self.location_error.take() {
            self.post(HostEvent::LocationFailed(message));
        }
        info!(fixes = self.fixes.len(), "Delivering scenario location fixes");
        self.post(HostEvent::LocationUpdated(self.fixes.clone()));
    }

    fn start_heading(&mut self) {
        if self.heading_active {
            return;
        }
        self.heading_active = true;
        debug!(samples = self.heading_samples.len(), "Heading updates started");
        for sample in &self.heading_samples {
            self.post(HostEvent::HeadingUpdated(*sample));
        }
    }

    fn stop_heading(&mut self) {
        if self.heading_active {
            debug!("Heading updates stopped");
        }
        self.heading_active = false;
    }
}
