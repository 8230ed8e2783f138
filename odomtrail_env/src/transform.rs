//! Coordinate-frame transform service abstraction.

use crate::error::TransformError;
use crate::types::StampedPose;

/// Re-expresses stamped poses in another coordinate frame.
///
/// Lookups are synchronous. They may fail (unknown frame, extrapolation,
/// ...) but must not block indefinitely; any timeout policy lives in the
/// implementation.
pub trait TransformService {
    /// Expresses `pose` in `target_frame`.
    ///
    /// # Returns
    /// * `Ok(pose)` - Same physical pose, `frame_id == target_frame`, stamp preserved
    /// * `Err(TransformError)` - No transform could be resolved
    fn transform_pose(
        &self,
        target_frame: &str,
        pose: &StampedPose,
    ) -> Result<StampedPose, TransformError>;
}

impl<T: TransformService + ?Sized> TransformService for &T {
    fn transform_pose(
        &self,
        target_frame: &str,
        pose: &StampedPose,
    ) -> Result<StampedPose, TransformError> {
        (**self).transform_pose(target_frame, pose)
    }
}
