//! Session input and output events

use serde::{Deserialize, Serialize};
use sightspotter_core::{GeoPoint, HeadingSample};
use sightspotter_geosearch::FailureKind;

/// Location permission state reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedAlways | Self::AuthorizedWhenInUse)
    }
}

/// Events delivered by the host's sensor and permission callbacks
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// Location permission changed
    AuthorizationChanged(AuthorizationStatus),
    /// One or more location fixes, oldest first; only the last is used
    LocationUpdated(Vec<GeoPoint>),
    /// Location acquisition failed
    LocationFailed(String),
    /// One heading sensor reading
    HeadingUpdated(HeadingSample),
    /// Stop the session loop
    Shutdown,
}

/// Session progress, broadcast to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new placement cycle started fetching placemarks
    FetchStarted { generation: u64, at: GeoPoint },
    /// The fetch failed; the cycle ends here
    FetchFailed { generation: u64, kind: FailureKind },
    /// Placemarks arrived; waiting for a stable heading
    PlacemarksReceived { generation: u64, count: usize },
    /// The heading stabilizer committed a value
    HeadingCommitted { generation: u64, heading: f64 },
    /// Every placemark got an anchor
    PlacementCompleted { generation: u64, anchors: usize },
    /// The camera frame was unavailable; the pass stopped early
    PlacementAborted {
        generation: u64,
        placed: usize,
        remaining: usize,
    },
}
