//! Common types shared between the display and its collaborators.

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a display instance.
///
/// Hosts use it to map a picked arrow back to the display that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId(pub Uuid);

impl DisplayId {
    /// Creates a new random DisplayId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a DisplayId from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DisplayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Opaque handle to an arrow primitive owned by a [`crate::SceneRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArrowHandle(pub u64);

impl std::fmt::Display for ArrowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "arrow#{}", self.0)
    }
}

/// Opaque handle to a scene node (a group of primitives sharing visibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorRgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Attaches an alpha channel.
    pub const fn with_alpha(self, a: f32) -> ColorRgba {
        ColorRgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    /// Same color, fully opaque.
    pub const fn opaque(self) -> ColorRgba {
        self.with_alpha(1.0)
    }
}

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    /// Quantizes to 8-bit channels (clamped).
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// Message timestamp (seconds + nanoseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub sec: i32,
    pub nanosec: u32,
}

impl Stamp {
    pub const fn new(sec: i32, nanosec: u32) -> Self {
        Self { sec, nanosec }
    }

    /// Builds a stamp from fractional seconds (negative values clamp to zero).
    pub fn from_secs_f64(secs: f64) -> Self {
        let secs = secs.max(0.0);
        let whole = secs.floor();
        let nanosec = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        Self {
            sec: whole as i32,
            nanosec,
        }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nanosec as f64 * 1e-9
    }
}

/// Message header: when and in which frame the payload was expressed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Stamp,

    /// Frame the payload is expressed in; empty means "unspecified"
    pub frame_id: String,
}

/// Position + orientation exactly as carried by a message.
///
/// The quaternion is stored raw, without normalization, so tolerance checks
/// see the same numbers the publisher sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,

    /// Quaternion with coords `[x, y, z, w]`
    pub orientation: Quaternion<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: Quaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at `position` with identity orientation.
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), Quaternion::identity())
    }

    /// Planar pose: position plus heading about +z.
    pub fn from_xy_yaw(x: f64, y: f64, yaw: f64) -> Self {
        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, yaw);
        Self::new(Vector3::new(x, y, 0.0), q.into_inner())
    }

    /// Converts to a rigid transform.
    ///
    /// A zero or non-finite quaternion has no rotation to offer and maps to
    /// identity; anything else is normalized.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let norm = self.orientation.norm();
        let rotation = if norm.is_finite() && norm > f64::EPSILON {
            UnitQuaternion::from_quaternion(self.orientation)
        } else {
            UnitQuaternion::identity()
        };
        Isometry3::from_parts(Translation3::from(self.position), rotation)
    }
}

/// Odometry estimate as delivered by the transport.
///
/// Only the fields the trail display consumes are modeled; twist and
/// covariances stay with the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OdometryMessage {
    pub header: Header,

    /// Frame the pose points to (e.g. `base_link`)
    pub child_frame_id: String,

    pub pose: Pose,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vector3::zeros(), Quaternion::identity())
    }
}

impl OdometryMessage {
    /// Creates a message stamped at `stamp` in `frame_id`.
    pub fn new(frame_id: impl Into<String>, stamp: Stamp, pose: Pose) -> Self {
        Self {
            header: Header {
                stamp,
                frame_id: frame_id.into(),
            },
            child_frame_id: String::new(),
            pose,
        }
    }
}

/// A rigid pose tagged with the frame it is expressed in and its time.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedPose {
    pub frame_id: String,
    pub stamp: Stamp,
    pub transform: Isometry3<f64>,
}

impl StampedPose {
    pub fn new(frame_id: impl Into<String>, stamp: Stamp, transform: Isometry3<f64>) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
            transform,
        }
    }
}
