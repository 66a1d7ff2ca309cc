//! Sightspotter Session - event-driven host integration
//!
//! This crate wires the placement engine to its collaborators:
//! - Host events (authorization, location fixes, heading samples) arrive on a channel
//! - Placemark fetches run on background tasks; the newest location fix wins
//! - Heading stabilization and anchor placement run on one foreground task
//! - Progress is broadcast as session events; anchors are readable via a directory handle

pub mod event;
pub mod sensors;
pub mod session;

pub use event::{AuthorizationStatus, HostEvent, SessionEvent};
pub use sensors::SensorControl;
pub use session::{AnchorDirectory, SessionConfig, SightSession};
