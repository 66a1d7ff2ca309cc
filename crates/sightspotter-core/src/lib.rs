//! Sightspotter Core - geospatial-to-view-space placement engine
//!
//! This crate turns a user location, a stabilized compass heading and a list
//! of nearby points of interest into AR anchor transforms:
//! - Great-circle bearing and haversine distance between geographic points
//! - Heading stabilization that discards the first sensor reading
//! - Anchor transform synthesis relative to the live camera pose
//! - Placement engine that owns the anchor-to-placemark identity map

pub mod anchor;
pub mod engine;
pub mod geo;
pub mod heading;
pub mod placemark;
pub mod transform;

pub use anchor::{AnchorId, AnchorRecord, ArSession, MemoryArSession};
pub use engine::{PlacementError, PlacementReport, SightPlacementEngine};
pub use geo::{bearing, haversine_distance, GeoError, GeoPoint};
pub use heading::{HeadingCommit, HeadingReference, HeadingSample, HeadingStabilizer, StabilizerState};
pub use placemark::Placemark;
pub use transform::{synthesize, AnchorPlacement, CameraPose, Pose};
