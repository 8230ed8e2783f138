//! Motion filter: decides whether a new pose is far enough from the last
//! accepted one to be worth another arrow.
//!
//! Dense, near-static odometry streams would otherwise pile hundreds of
//! identical arrows on top of each other.

use nalgebra::UnitQuaternion;
use odomtrail_env::Pose;

use crate::config::AngleMetric;

/// Position / orientation tolerance pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionFilter {
    pub position_tolerance: f32,
    pub angle_tolerance: f32,
    pub angle_metric: AngleMetric,
}

impl MotionFilter {
    pub fn new(position_tolerance: f32, angle_tolerance: f32, angle_metric: AngleMetric) -> Self {
        Self {
            position_tolerance,
            angle_tolerance,
            angle_metric,
        }
    }

    /// Returns `true` when `current` should be skipped because it is within
    /// both tolerances of `last`.
    ///
    /// Both comparisons are strict. NaN distances never pass, so degenerate
    /// poses are always kept.
    pub fn is_redundant(&self, last: &Pose, current: &Pose) -> bool {
        let distance = position_distance(last, current);
        let angle = orientation_difference(last, current, self.angle_metric);

        distance < f64::from(self.position_tolerance) && angle < f64::from(self.angle_tolerance)
    }
}

/// Euclidean distance between the two positions.
pub fn position_distance(a: &Pose, b: &Pose) -> f64 {
    (a.position - b.position).norm()
}

/// Orientation difference between two poses under `metric`.
pub fn orientation_difference(a: &Pose, b: &Pose, metric: AngleMetric) -> f64 {
    match metric {
        AngleMetric::ComponentDifference => (a.orientation.coords - b.orientation.coords).norm(),
        AngleMetric::Geodesic => {
            let (na, nb) = (a.orientation.norm(), b.orientation.norm());
            if na <= f64::EPSILON || nb <= f64::EPSILON {
                return f64::NAN;
            }
            let qa = UnitQuaternion::from_quaternion(a.orientation);
            let qb = UnitQuaternion::from_quaternion(b.orientation);
            qa.angle_to(&qb)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Quaternion, Vector3};
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn filter(pos: f32, ang: f32) -> MotionFilter {
        MotionFilter::new(pos, ang, AngleMetric::ComponentDifference)
    }

    #[test]
    fn test_close_pose_is_redundant() {
        let f = filter(0.1, 0.1);
        let a = Pose::from_position(0.0, 0.0, 0.0);
        let b = Pose::from_position(0.05, 0.0, 0.0);
        assert!(f.is_redundant(&a, &b));
    }

    #[test]
    fn test_far_pose_is_kept() {
        let f = filter(0.1, 0.1);
        let a = Pose::from_position(0.0, 0.0, 0.0);
        let c = Pose::from_position(0.5, 0.0, 0.0);
        assert!(!f.is_redundant(&a, &c));
    }

    #[test]
    fn test_rotation_alone_is_kept() {
        let f = filter(0.1, 0.1);
        let a = Pose::from_xy_yaw(0.0, 0.0, 0.0);
        let b = Pose::from_xy_yaw(0.0, 0.0, FRAC_PI_2);
        assert!(!f.is_redundant(&a, &b));
    }

    #[test]
    fn test_boundary_is_not_redundant() {
        // Strict comparison: exactly at the tolerance is kept.
        let f = filter(1.0, 1.0);
        let a = Pose::from_position(0.0, 0.0, 0.0);
        let b = Pose::from_position(1.0, 0.0, 0.0);
        assert!(!f.is_redundant(&a, &b));
    }

    #[test]
    fn test_zero_tolerance_keeps_everything() {
        let f = filter(0.0, 0.0);
        let a = Pose::from_position(0.0, 0.0, 0.0);
        assert!(!f.is_redundant(&a, &a));
    }

    #[test]
    fn test_component_difference_of_yaw() {
        // yaw 0 -> (0,0,0,1); yaw pi/2 -> (0,0,s,s) with s = 1/sqrt(2)
        let a = Pose::from_xy_yaw(0.0, 0.0, 0.0);
        let b = Pose::from_xy_yaw(0.0, 0.0, FRAC_PI_2);
        let s = 0.5f64.sqrt();
        let expected = (s * s + (1.0 - s) * (1.0 - s)).sqrt();
        assert_relative_eq!(
            orientation_difference(&a, &b, AngleMetric::ComponentDifference),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_component_difference_sees_double_cover() {
        // q and -q are the same rotation but two units apart component-wise.
        let a = Pose::new(Vector3::zeros(), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let b = Pose::new(Vector3::zeros(), Quaternion::new(-1.0, 0.0, 0.0, 0.0));
        assert_relative_eq!(
            orientation_difference(&a, &b, AngleMetric::ComponentDifference),
            2.0
        );
        assert_relative_eq!(
            orientation_difference(&a, &b, AngleMetric::Geodesic),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_geodesic_is_rotation_angle() {
        let a = Pose::from_xy_yaw(0.0, 0.0, 0.0);
        let b = Pose::from_xy_yaw(0.0, 0.0, PI / 3.0);
        assert_relative_eq!(
            orientation_difference(&a, &b, AngleMetric::Geodesic),
            PI / 3.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_quaternion_never_filtered() {
        let f = MotionFilter::new(1.0, 10.0, AngleMetric::Geodesic);
        let a = Pose::new(Vector3::zeros(), Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert!(!f.is_redundant(&a, &a));
    }

    proptest! {
        #[test]
        fn prop_pure_translation_redundant_iff_within_tolerance(
            dx in -1.0f64..1.0,
            pos_tol in 0.0f32..1.0,
            ang_tol in 0.0f32..2.0,
        ) {
            let f = filter(pos_tol, ang_tol);
            let a = Pose::from_position(0.0, 0.0, 0.0);
            let b = Pose::from_position(dx, 0.0, 0.0);

            // Identical orientations differ by exactly 0.
            let expected = position_distance(&a, &b) < f64::from(pos_tol) && ang_tol > 0.0;

            prop_assert_eq!(f.is_redundant(&a, &b), expected);
        }
    }
}
