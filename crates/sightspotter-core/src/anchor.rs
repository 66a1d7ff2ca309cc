//! AR anchors and the AR session collaborator

use chrono::{DateTime, Utc};
use glam::DMat4;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::transform::CameraPose;

/// Opaque anchor identifier minted by the AR session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorId(pub Uuid);

impl AnchorId {
    /// Mint a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AnchorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An anchor placed for one placemark during one placement pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub id: AnchorId,
    /// Placemark title shown by the renderer
    pub title: String,
    pub description: Option<String>,
    pub location: GeoPoint,
    /// Ground distance from the user in metres
    pub distance_m: f64,
    /// Compass bearing from the user in degrees
    pub bearing: f64,
    /// Anchor-to-world transform
    pub transform: DMat4,
    pub placed_at: DateTime<Utc>,
}

/// The AR session as seen by the placement engine
pub trait ArSession {
    /// Camera pose of the current frame, if a frame is available
    fn current_camera(&self) -> Option<CameraPose>;

    /// Register an anchor at `transform` and return its new identifier
    fn add_anchor(&mut self, transform: DMat4) -> AnchorId;

    /// Remove a previously registered anchor. Unknown ids are ignored.
    fn remove_anchor(&mut self, id: &AnchorId);
}

/// In-process AR session for hosts without a camera pipeline
#[derive(Debug, Clone, Default)]
pub struct MemoryArSession {
    camera: Option<CameraPose>,
    anchors: HashMap<AnchorId, DMat4>,
}

impl MemoryArSession {
    pub fn new(camera: Option<CameraPose>) -> Self {
        Self {
            camera,
            anchors: HashMap::new(),
        }
    }

    /// Replace the current frame's camera pose (`None` = no frame yet)
    pub fn set_camera(&mut self, camera: Option<CameraPose>) {
        self.camera = camera;
    }

    pub fn anchor(&self, id: &AnchorId) -> Option<&DMat4> {
        self.anchors.get(id)
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }
}

impl ArSession for MemoryArSession {
    fn current_camera(&self) -> Option<CameraPose> {
        self.camera
    }

    fn add_anchor(&mut self, transform: DMat4) -> AnchorId {
        let id = AnchorId::new();
        self.anchors.insert(id, transform);
        id
    }

    fn remove_anchor(&mut self, id: &AnchorId) {
        self.anchors.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_ids_are_unique() {
        let a = AnchorId::new();
        let b = AnchorId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }

    #[test]
    fn test_memory_session_add_remove() {
        let mut session = MemoryArSession::new(Some(CameraPose::identity()));
        let id = session.add_anchor(DMat4::IDENTITY);
        assert_eq!(session.anchor_count(), 1);
        assert_eq!(session.anchor(&id), Some(&DMat4::IDENTITY));

        session.remove_anchor(&id);
        session.remove_anchor(&id);
        assert_eq!(session.anchor_count(), 0);
    }

    #[test]
    fn test_anchor_record_serializes() {
        let record = AnchorRecord {
            id: AnchorId::new(),
            title: "Eiffel Tower".to_string(),
            description: None,
            location: GeoPoint::new(48.5, 2.25).unwrap(),
            distance_m: 1200.0,
            bearing: 45.0,
            transform: DMat4::IDENTITY,
            placed_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: AnchorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
