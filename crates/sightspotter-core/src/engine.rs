//! Placement engine: one anchor per placemark, plus the identity map the
//! renderer uses to label anchors.

use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::anchor::{AnchorId, AnchorRecord, ArSession};
use crate::geo::{haversine_distance, GeoPoint};
use crate::placemark::Placemark;
use crate::transform::synthesize;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("No camera frame available ({placed} placed, {remaining} skipped)")]
    NoCameraFrame { placed: usize, remaining: usize },
}

/// Summary of a completed placement pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementReport {
    pub placed: usize,
    pub heading: f64,
}

/// Owns the anchors of the current placement cycle
#[derive(Debug, Default)]
pub struct SightPlacementEngine {
    records: HashMap<AnchorId, AnchorRecord>,
    /// Placement order, for stable listings
    order: Vec<AnchorId>,
}

impl SightPlacementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Title for an anchor, as requested by the renderer's node callback
    pub fn title_for(&self, id: &AnchorId) -> Option<&str> {
        self.records.get(id).map(|r| r.title.as_str())
    }

    pub fn record(&self, id: &AnchorId) -> Option<&AnchorRecord> {
        self.records.get(id)
    }

    /// Records in placement order
    pub fn records(&self) -> impl Iterator<Item = &AnchorRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Remove every anchor of the previous cycle from the session and forget it
    pub fn clear<S: ArSession + ?Sized>(&mut self, session: &mut S) {
        if self.order.is_empty() {
            return;
        }
        debug!(anchors = self.order.len(), "Releasing previous anchors");
        for id in self.order.drain(..) {
            session.remove_anchor(&id);
        }
        self.records.clear();
    }

    /// Place one anchor per placemark, replacing the previous cycle's anchors.
    ///
    /// The camera pose is read for every placemark; if it is missing the pass
    /// stops there and the remaining placemarks are not placed.
    pub fn place<S: ArSession + ?Sized>(
        &mut self,
        user: GeoPoint,
        heading: f64,
        placemarks: &[Placemark],
        session: &mut S,
    ) -> Result<PlacementReport, PlacementError> {
        self.clear(session);

        for (index, placemark) in placemarks.iter().enumerate() {
            let Some(camera) = session.current_camera() else {
                let remaining = placemarks.len() - index;
                warn!(
                    placed = index,
                    remaining = remaining,
                    "No camera frame, aborting placement pass"
                );
                return Err(PlacementError::NoCameraFrame {
                    placed: index,
                    remaining,
                });
            };

            let distance = haversine_distance(user, placemark.location);
            let placement = synthesize(user, placemark.location, heading, distance, &camera);
            let id = session.add_anchor(placement.transform);

            debug!(
                anchor = %id,
                title = %placemark.title,
                distance = distance,
                bearing = placement.azimuth,
                "Placed anchor"
            );

            self.records.insert(
                id,
                AnchorRecord {
                    id,
                    title: placemark.title.clone(),
                    description: placemark.description.clone(),
                    location: placemark.location,
                    distance_m: distance,
                    bearing: placement.azimuth,
                    transform: placement.transform,
                    placed_at: Utc::now(),
                },
            );
            self.order.push(id);
        }

        info!(
            anchors = placemarks.len(),
            heading = heading,
            user = %user,
            "Placement pass complete"
        );

        Ok(PlacementReport {
            placed: placemarks.len(),
            heading,
        })
    }
}
