//! Robot → scene coordinate conventions.
//!
//! Poses arrive in the robot convention (x forward, y left, z up). Renderers
//! disagree on which way is up, so the display converts every arrow into the
//! renderer's convention before handing it over.

use nalgebra::{Isometry3, Matrix3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Axis convention of a scene renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneConvention {
    /// Right-handed, z up. Same axes as the robot; conversion is the identity.
    #[default]
    ZUp,

    /// Right-handed, y up, looking down -z (Ogre / OpenGL style).
    /// Robot `(x, y, z)` maps to scene `(-y, z, -x)`.
    YUp,
}

impl SceneConvention {
    /// Rotation taking robot axes to scene axes.
    pub fn basis(&self) -> UnitQuaternion<f64> {
        match self {
            SceneConvention::ZUp => UnitQuaternion::identity(),
            SceneConvention::YUp => {
                #[rustfmt::skip]
                let m = Matrix3::new(
                     0.0, -1.0, 0.0,
                     0.0,  0.0, 1.0,
                    -1.0,  0.0, 0.0,
                );
                UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m))
            }
        }
    }

    /// Converts a robot-frame point to scene coordinates.
    pub fn point_to_scene(&self, point: &Vector3<f64>) -> Vector3<f32> {
        match self {
            SceneConvention::ZUp => point.cast::<f32>(),
            SceneConvention::YUp => Vector3::new(-point.y, point.z, -point.x).cast::<f32>(),
        }
    }

    /// Re-expresses a robot-frame orientation in scene axes.
    ///
    /// Conjugating by the basis rotation keeps the meaning of the arrow's
    /// local axes: robot +x still points where the scene image of +x is.
    pub fn orientation_to_scene(&self, orientation: &UnitQuaternion<f64>) -> UnitQuaternion<f32> {
        let basis = self.basis();
        let scene = basis * orientation * basis.inverse();
        UnitQuaternion::new_normalize(scene.into_inner().cast::<f32>())
    }

    /// Converts a full pose.
    pub fn pose_to_scene(&self, pose: &Isometry3<f64>) -> (Vector3<f32>, UnitQuaternion<f32>) {
        (
            self.point_to_scene(&pose.translation.vector),
            self.orientation_to_scene(&pose.rotation),
        )
    }
}
