//! Camera poses and anchor transform synthesis
//!
//! AR world space is right-handed with +Y up; a camera looks down its local
//! -Z axis. Transforms are column-major `DMat4` and compose right-to-left, so
//! `a * b` applies `b` first.

use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

use crate::geo::{bearing, deg_to_rad, GeoPoint};

/// Pitch applied to an anchor at zero distance (radians)
pub const TILT_OFFSET_RAD: f64 = -0.2;

/// Metres of distance per radian of additional pitch
pub const TILT_DISTANCE_SCALE_M: f64 = 6000.0;

/// Real-world metres per AR scene unit
pub const SCENE_SCALE_M: f64 = 200.0;

/// Pose in 3D space (x, y, z, roll, pitch, yaw)
///
/// Angles are radians: yaw about +Y, pitch about +X, roll about +Z, applied
/// in that order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
}

impl Pose {
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
            roll: arr[3],
            pitch: arr[4],
            yaw: arr[5],
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.roll, self.pitch, self.yaw]
    }

    pub fn rotation(&self) -> DQuat {
        DQuat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, self.roll)
    }

    pub fn translation(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

/// Live camera pose in AR world space (rigid: rotation + translation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    transform: DMat4,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::identity()
    }
}

impl CameraPose {
    pub fn identity() -> Self {
        Self {
            transform: DMat4::IDENTITY,
        }
    }

    pub fn from_rotation_translation(rotation: DQuat, translation: DVec3) -> Self {
        Self {
            transform: DMat4::from_rotation_translation(rotation.normalize(), translation),
        }
    }

    pub fn from_pose(pose: &Pose) -> Self {
        Self::from_rotation_translation(pose.rotation(), pose.translation())
    }

    /// Camera-to-world transform
    pub fn transform(&self) -> DMat4 {
        self.transform
    }

    pub fn position(&self) -> DVec3 {
        self.transform.w_axis.truncate()
    }
}

impl From<Pose> for CameraPose {
    fn from(pose: Pose) -> Self {
        Self::from_pose(&pose)
    }
}

/// Pitch for an anchor `distance_m` away: far markers are raised, near ones
/// lowered. Affine: -0.2 rad at 0 m, 0.8 rad at 6000 m.
pub fn tilt_for_distance(distance_m: f64) -> f64 {
    TILT_OFFSET_RAD + distance_m / TILT_DISTANCE_SCALE_M
}

/// Offset along the camera's local Z axis, in scene units (negative is in
/// front of the camera)
pub fn depth_for_distance(distance_m: f64) -> f64 {
    -(distance_m / SCENE_SCALE_M)
}

/// Yaw the forward axis by `angle` radians, clockwise seen from above
pub fn horizontal_rotation(angle: f64) -> DMat4 {
    DMat4::from_rotation_y(-angle)
}

/// Pitch the forward axis up by `tilt` radians
pub fn vertical_rotation(tilt: f64) -> DMat4 {
    DMat4::from_rotation_x(tilt)
}

/// Result of placing one target relative to the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPlacement {
    /// Compass bearing from the user to the target (degrees)
    pub azimuth: f64,
    /// Target direction relative to the device heading (radians)
    pub angle: f64,
    /// Pitch compensation (radians)
    pub tilt: f64,
    /// Translation along the local Z axis (scene units)
    pub depth: f64,
    pub distance_m: f64,
    /// Anchor-to-world transform
    pub transform: DMat4,
}

impl AnchorPlacement {
    /// Anchor position in world space
    pub fn position(&self) -> DVec3 {
        self.transform.w_axis.truncate()
    }
}

/// Build the world transform for an anchor pointing at `target`.
///
/// Deterministic and infallible for finite inputs; `heading` and
/// `distance_m` must be finite.
pub fn synthesize(
    user: GeoPoint,
    target: GeoPoint,
    heading: f64,
    distance_m: f64,
    camera: &CameraPose,
) -> AnchorPlacement {
    let azimuth = bearing(user, target);
    let angle = deg_to_rad(azimuth - heading);
    let tilt = tilt_for_distance(distance_m);
    let depth = depth_for_distance(distance_m);

    let rotation = horizontal_rotation(angle) * vertical_rotation(tilt);
    let world_rotation = camera.transform() * rotation;
    let translation = DMat4::from_translation(DVec3::new(0.0, 0.0, depth));

    AnchorPlacement {
        azimuth,
        angle,
        tilt,
        depth,
        distance_m,
        transform: world_rotation * translation,
    }
}
